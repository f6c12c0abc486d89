//! Error types for markdown conversion and template compilation.

use thiserror::Error;

use crate::template::TemplateSyntaxError;

/// Errors raised while resolving configuration or converting markdown.
///
/// Cells that are not text are never errors; the renderer declines them.
#[derive(Debug, Error)]
pub enum Error {
    /// Extension name not recognized by the markdown converter.
    #[error("Unknown markdown extension '{0}'")]
    UnknownExtension(String),

    /// Plugin configuration could not be decoded.
    #[error("Invalid plugin configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// `{% markdown %}` tag failed to compile.
    #[error(transparent)]
    Template(#[from] TemplateSyntaxError),

    /// Code block highlighting failed.
    #[error("Failed to highlight code block: {0}")]
    Highlight(#[from] syntect::Error),
}

/// Result alias for fallible conversion operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
