//! Markdown rendering for table cells and templates.
//!
//! Flagged columns of a data-browsing host are converted from markdown to
//! sanitized HTML. The same conversion is available to templates as the
//! `render_markdown` function and the `{% markdown %}` block tag.

pub mod cell;
pub mod config;
mod error;
pub mod markdown;
pub mod plugin;
pub mod template;
mod util;

/// Key of this plugin's configuration in host metadata.
pub const PLUGIN_NAME: &str = "cellmark";

pub use cell::{Cell, CellValue, render_cell, should_convert};
pub use config::{DEFAULT_PATTERN, Metadata, PluginSettings};
pub use error::{Error, Result};
pub use markdown::{MarkdownRenderer, RenderOptions, render_markdown};
pub use plugin::{MarkdownPlugin, Plugin};
pub use template::TemplateSyntaxError;
