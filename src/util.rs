//! Utility functions for cellmark

/// Escapes text content for HTML output.
///
/// Matches the escaping the sanitizer's serializer applies to text nodes,
/// so re-escaped text round trips unchanged.
///
/// # Arguments
///
/// * `text`: Plain text to escape
///
/// # Returns
///
/// HTML safe string
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes a value for use inside a double quoted HTML attribute.
pub fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

/// Decodes the HTML entities produced by markdown and sanitizer output.
///
/// `&amp;` is decoded last so that escaped entities such as `&amp;lt;`
/// decode to `&lt;` rather than `<`.
///
/// # Arguments
///
/// * `html`: HTML encoded string
///
/// # Returns
///
/// Decoded string with actual characters
pub fn decode_entities(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
