//! Markdown rendering with allow-list sanitization.
//!
//! This module converts markdown to HTML using comrak, sanitizes the result
//! with ammonia against a base allow-list plus configured additions, then
//! patches images and autolinks bare URLs outside code regions.

mod extensions;
mod filters;
mod highlight;
mod renderer;
mod sanitize;

use maud::Markup;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::Result;

pub use extensions::Extension;
pub use filters::IMAGE_STYLE;
pub use renderer::{CONTAINER_STYLE, MarkdownRenderer};
pub use sanitize::{BASE_TAGS, Sanitizer};

/// Converter inputs resolved from configuration or template arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Markdown extension names.
    pub extensions: Vec<String>,
    /// Tags allowed on top of [`BASE_TAGS`].
    pub extra_tags: Vec<String>,
    /// Attributes allowed on top of the base attributes, keyed by tag.
    pub extra_attrs: BTreeMap<String, Vec<String>>,
}

/// Renders markdown text to sanitized HTML wrapped in the block container.
///
/// Convenience wrapper building a [`MarkdownRenderer`] for a single render.
///
/// # Errors
///
/// Returns error if an extension name is unknown or highlighting fails.
pub fn render_markdown(text: Option<&str>, options: &RenderOptions) -> Result<Markup> {
    MarkdownRenderer::new(options)?.render(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_list() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render_markdown(Some("* one"), &options)
            .expect("Should render")
            .into_string();

        // Assert
        assert_eq!(
            html,
            "<div style=\"white-space: normal\"><ul>\n<li>one</li>\n</ul></div>"
        );
    }

    #[test]
    fn test_render_markdown_none() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render_markdown(None, &options)
            .expect("Should render")
            .into_string();

        // Assert
        assert_eq!(html, "<div style=\"white-space: normal\"></div>");
    }

    #[test]
    fn test_render_options_deserialize_partial() {
        // Arrange
        let json = r#"{"extra_tags": ["table"]}"#;

        // Act
        let options: RenderOptions = serde_json::from_str(json).expect("Should deserialize");

        // Assert
        assert!(options.extensions.is_empty());
        assert_eq!(options.extra_tags, vec!["table".to_string()]);
        assert!(options.extra_attrs.is_empty());
    }
}
