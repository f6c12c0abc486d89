//! Markdown to sanitized HTML conversion.

use comrak::Options;
use maud::{Markup, PreEscaped, html};

use super::extensions::Extension;
use super::sanitize::Sanitizer;
use super::{RenderOptions, filters, highlight};
use crate::Result;

/// Inline style of the block container wrapping every rendered fragment.
pub const CONTAINER_STYLE: &str = "white-space: normal";

/// Renders markdown to sanitized HTML.
///
/// Pipeline: comrak parse with the selected extensions (raw HTML passes
/// through to the sanitizer), optional code highlighting, ammonia
/// sanitization, then post-sanitization filters (image style, autolinks).
/// Output is wrapped in a `div` with `white-space: normal` so cell styling
/// does not collapse the rendered blocks.
pub struct MarkdownRenderer<'a> {
    options: Options<'a>,
    highlight: bool,
    sanitizer: Sanitizer<'a>,
}

impl<'a> MarkdownRenderer<'a> {
    /// Creates renderer for the given extensions and allow-list additions.
    ///
    /// # Arguments
    ///
    /// * `render_options`: Extension names, extra tags and extra attributes
    ///
    /// # Errors
    ///
    /// Returns error if an extension name is not recognized
    pub fn new(render_options: &'a RenderOptions) -> Result<Self> {
        let mut options = Options::default();

        // Sanitizer decides on raw HTML, not the parser
        options.render.unsafe_ = true;

        let mut highlight = false;
        for name in &render_options.extensions {
            let extension: Extension = name.parse()?;
            extension.apply(&mut options);
            highlight |= extension == Extension::CodeHilite;
        }

        Ok(Self {
            options,
            highlight,
            sanitizer: Sanitizer::new(&render_options.extra_tags, &render_options.extra_attrs),
        })
    }

    /// Renders markdown content to sanitized HTML markup.
    ///
    /// Absent content renders an empty container. Malformed markdown never
    /// fails; comrak renders whatever it can.
    ///
    /// # Arguments
    ///
    /// * `content`: Markdown source, or None for an absent value
    ///
    /// # Returns
    ///
    /// Pre-escaped markup safe to embed verbatim
    ///
    /// # Errors
    ///
    /// Returns error if code highlighting fails
    pub fn render(&self, content: Option<&str>) -> Result<Markup> {
        let Some(content) = content else {
            return Ok(container(""));
        };

        let mut html = comrak::markdown_to_html(content, &self.options);

        if self.highlight {
            html = highlight::highlight_code_blocks(&html)?;
        }

        let html = self.sanitizer.clean(&html);
        let html = filters::apply(&html);

        tracing::trace!(input_len = content.len(), output_len = html.len(), "Rendered markdown");

        Ok(container(html.trim_end()))
    }
}

/// Wraps an HTML fragment in the block container.
fn container(fragment: &str) -> Markup {
    html! {
        div style=(CONTAINER_STYLE) { (PreEscaped(fragment)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn render(markdown: &str, options: &RenderOptions) -> String {
        MarkdownRenderer::new(options)
            .expect("Should build renderer")
            .render(Some(markdown))
            .expect("Should render markdown")
            .into_string()
    }

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_render_absent_value() {
        // Arrange
        let options = RenderOptions::default();
        let renderer = MarkdownRenderer::new(&options).expect("Should build renderer");

        // Act
        let html = renderer.render(None).expect("Should render").into_string();

        // Assert
        assert_eq!(html, r#"<div style="white-space: normal"></div>"#);
    }

    #[test]
    fn test_render_heading_and_list() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render("# Hello there\n* one\n*two\n*three", &options);

        // Assert
        // CommonMark keeps "*two" and "*three" as lazy continuation text of
        // the first item; Python-Markdown turned them into <em> spans.
        assert!(html.starts_with(r#"<div style="white-space: normal"><h1>Hello there</h1>"#));
        assert!(html.contains("*two"), "Literal asterisks kept: {}", html);
        assert!(html.ends_with("</ul></div>"), "Trailing newline trimmed: {}", html);
        assert_eq!(html.matches("<ul>").count(), 1, "Single list: {}", html);
        assert_eq!(html.matches("<li>").count(), 1, "Single item: {}", html);
    }

    #[test]
    fn test_render_image_style() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render("![Alt text](https://www.example.com/blah.png)", &options);

        // Assert
        assert!(html.contains(r#"src="https://www.example.com/blah.png""#), "{}", html);
        assert!(html.contains(r#"alt="Alt text""#), "{}", html);
        assert!(html.contains(r#"style="max-width: 100%""#), "{}", html);
    }

    #[test]
    fn test_render_link_nofollow_and_escaping() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render("[This & That](https://www.example.com/)", &options);

        // Assert
        assert!(html.contains(r#"href="https://www.example.com/""#), "{}", html);
        assert!(html.contains(r#"rel="nofollow""#), "{}", html);
        assert!(html.contains("This &amp; That"), "{}", html);
    }

    #[test]
    fn test_render_tables_need_extension() {
        // Arrange
        let markdown = "First Header | Second Header\n------------- | -------------\nContent Cell | Content Cell";
        let plain = RenderOptions::default();
        let with_tables = RenderOptions {
            extensions: tags(&["tables"]),
            extra_tags: tags(&["table", "thead", "tr", "th", "td", "tbody"]),
            extra_attrs: BTreeMap::new(),
        };

        // Act
        let without = render(markdown, &plain);
        let with = render(markdown, &with_tables);

        // Assert
        assert!(!without.contains("<table>"), "No table without extension: {}", without);
        assert!(without.contains("<p>First Header | Second Header"), "{}", without);
        assert!(with.contains("<table>"), "{}", with);
        assert!(with.contains("<thead>"), "{}", with);
        assert!(with.contains("<tbody>"), "{}", with);
        assert!(with.contains("<th>First Header</th>"), "{}", with);
    }

    #[test]
    fn test_render_table_stripped_without_extra_tags() {
        // Arrange
        let options = RenderOptions {
            extensions: tags(&["tables"]),
            ..Default::default()
        };

        // Act
        let html = render("a | b\n--- | ---\n1 | 2", &options);

        // Assert
        assert!(!html.contains("<table>"), "Table tags not allowed: {}", html);
        assert!(html.contains("1"), "Cell text kept: {}", html);
    }

    #[test]
    fn test_render_code_block_not_linkified() {
        // Arrange
        let options = RenderOptions::default();
        let markdown = "```\nhttps://www.example.com/\n```\n\nhttps://www.example.com/";

        // Act
        let html = render(markdown, &options);

        // Assert
        assert!(
            html.contains("<pre><code>https://www.example.com/\n</code></pre>"),
            "Code block untouched: {}",
            html
        );
        assert!(
            html.contains(r#"<p><a href="https://www.example.com/" rel="nofollow">https://www.example.com/</a></p>"#),
            "Paragraph URL linkified: {}",
            html
        );
    }

    #[test]
    fn test_render_raw_html_sanitized() {
        // Arrange
        let options = RenderOptions::default();
        let markdown = "<p id=\"paragraph\" class=\"klass\">Paragraph</p>\n\n<script>alert('xss')</script>";

        // Act
        let html = render(markdown, &options);

        // Assert
        assert!(html.contains("<p>Paragraph</p>"), "{}", html);
        assert!(!html.contains("script"), "{}", html);
        assert!(!html.contains("alert"), "{}", html);
    }

    #[test]
    fn test_render_extra_attrs() {
        // Arrange
        let mut extra_attrs = BTreeMap::new();
        extra_attrs.insert("p".to_string(), tags(&["id", "class"]));
        let options = RenderOptions {
            extra_attrs,
            ..Default::default()
        };

        // Act
        let html = render("<p id=\"paragraph\" class=\"klass\">Paragraph</p>", &options);

        // Assert
        assert!(
            html.contains(r#"<p id="paragraph" class="klass">Paragraph</p>"#),
            "{}",
            html
        );
    }

    #[test]
    fn test_render_unknown_extension() {
        // Arrange
        let options = RenderOptions {
            extensions: tags(&["nonexistent"]),
            ..Default::default()
        };

        // Act
        let result = MarkdownRenderer::new(&options);

        // Assert
        assert!(
            matches!(result, Err(crate::Error::UnknownExtension(_))),
            "Unknown extension should fail"
        );
    }

    #[test]
    fn test_render_codehilite_with_span_allowed() {
        // Arrange
        let mut extra_attrs = BTreeMap::new();
        extra_attrs.insert("span".to_string(), tags(&["class"]));
        extra_attrs.insert("code".to_string(), tags(&["class"]));
        let options = RenderOptions {
            extensions: tags(&["codehilite"]),
            extra_tags: tags(&["span"]),
            extra_attrs,
        };

        // Act
        let html = render("```rust\nfn main() {}\n```", &options);

        // Assert
        assert!(html.contains("<code class=\"language-rust\">"), "{}", html);
        assert!(html.contains("<span class=\"hljs-"), "{}", html);
    }

    #[test]
    fn test_render_codehilite_spans_stripped_by_default() {
        // Arrange
        let options = RenderOptions {
            extensions: tags(&["codehilite"]),
            ..Default::default()
        };

        // Act
        let html = render("```rust\nfn main() {}\n```", &options);

        // Assert
        assert!(!html.contains("<span"), "Spans not allowed: {}", html);
        assert!(html.contains("fn main()"), "Code text kept: {}", html);
    }

    #[test]
    fn test_render_empty_markdown() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render("", &options);

        // Assert
        assert_eq!(html, r#"<div style="white-space: normal"></div>"#);
    }

    #[test]
    fn test_render_malformed_markdown() {
        // Arrange
        let options = RenderOptions::default();

        // Act
        let html = render("**unclosed [link](", &options);

        // Assert
        assert!(html.contains("unclosed"), "Best effort output: {}", html);
    }
}
