//! Compilation of `{% markdown %}` blocks into minijinja filter blocks.
//!
//! `{% markdown extensions="tables" %}body{% endmarkdown %}` becomes
//! `{% filter markdown_block(extensions=["tables"], extra_tags=[], extra_attrs={}) %}body{% endfilter %}`,
//! so minijinja renders the body, including loops and nested blocks, before
//! the converter sees it. Tag errors are reported here, before the template
//! reaches minijinja.

use std::collections::BTreeMap;

use super::attrs::parse_tag_attributes;
use super::{BLOCK_FILTER, TemplateSyntaxError};

const OPEN_TAG: &str = "markdown";
const CLOSE_TAG: &str = "endmarkdown";

/// Rewrites every `{% markdown %}` block in a template source.
///
/// Comments, expressions and `{% raw %}` sections are copied unchanged, as is
/// every other block tag. Whitespace control markers (`{%-`, `-%}`) on the
/// markdown tags are preserved.
///
/// # Arguments
///
/// * `source`: Template source
///
/// # Returns
///
/// Template source with markdown blocks rewritten
///
/// # Errors
///
/// Returns error with the line of the offending tag for invalid attributes,
/// a stray `endmarkdown`, or an unclosed `markdown` block
pub fn preprocess(source: &str) -> Result<String, TemplateSyntaxError> {
    let mut result = String::with_capacity(source.len());
    let mut open_blocks: Vec<usize> = Vec::new();
    let mut pos = 0;

    while let Some(offset) = find_delimiter(&source[pos..]) {
        let start = pos + offset;
        result.push_str(&source[pos..start]);

        let (closer, is_block) = match &source[start..start + 2] {
            "{#" => ("#}", false),
            "{{" => ("}}", false),
            _ => ("%}", true),
        };

        let Some(end) = find_closer(source, start + 2, closer) else {
            // Unterminated; minijinja reports it
            result.push_str(&source[start..]);
            return finish(result, &open_blocks);
        };

        let tag = &source[start..end];
        pos = end;

        if !is_block {
            result.push_str(tag);
            continue;
        }

        let block = BlockTag::parse(tag);
        match block.keyword {
            OPEN_TAG => {
                let line = line_number(source, start);
                let options = parse_tag_attributes(block.rest)
                    .map_err(|message| TemplateSyntaxError::new(message, line))?;
                open_blocks.push(line);
                result.push_str(&block.rewrite(&format!(
                    "filter {}(extensions={}, extra_tags={}, extra_attrs={})",
                    BLOCK_FILTER,
                    list_literal(&options.extensions),
                    list_literal(&options.extra_tags),
                    map_literal(&options.extra_attrs),
                )));
            }
            CLOSE_TAG => {
                if open_blocks.pop().is_none() {
                    return Err(TemplateSyntaxError::new(
                        format!("Encountered unknown tag '{}'.", CLOSE_TAG),
                        line_number(source, start),
                    ));
                }
                result.push_str(&block.rewrite("endfilter"));
            }
            "raw" => {
                result.push_str(tag);
                let raw_end = find_endraw(source, pos).unwrap_or(source.len());
                result.push_str(&source[pos..raw_end]);
                pos = raw_end;
            }
            _ => result.push_str(tag),
        }
    }

    result.push_str(&source[pos..]);
    finish(result, &open_blocks)
}

fn finish(result: String, open_blocks: &[usize]) -> Result<String, TemplateSyntaxError> {
    match open_blocks.last() {
        Some(&line) => Err(TemplateSyntaxError::new(
            format!(
                "Unexpected end of template. Jinja was looking for the following tags: '{}'. \
                 The innermost block that needs to be closed is '{}'.",
                CLOSE_TAG, OPEN_TAG
            ),
            line,
        )),
        None => Ok(result),
    }
}

/// Block tag split into whitespace markers, keyword and remaining text.
struct BlockTag<'a> {
    left_marker: &'a str,
    right_marker: &'a str,
    keyword: &'a str,
    rest: &'a str,
}

impl<'a> BlockTag<'a> {
    /// Splits `{%- keyword rest -%}` into its parts.
    fn parse(tag: &'a str) -> Self {
        let inner = &tag[2..tag.len() - 2];

        let (left_marker, inner) = split_marker_start(inner);
        let (inner, right_marker) = split_marker_end(inner);

        let inner = inner.trim_start();
        let keyword_len = inner
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(inner.len());

        Self {
            left_marker,
            right_marker,
            keyword: &inner[..keyword_len],
            rest: &inner[keyword_len..],
        }
    }

    /// Builds a block tag with the same whitespace markers and new content.
    fn rewrite(&self, statement: &str) -> String {
        format!(
            "{{%{} {} {}%}}",
            self.left_marker, statement, self.right_marker
        )
    }
}

fn split_marker_start(inner: &str) -> (&str, &str) {
    match inner.chars().next() {
        Some('-' | '+') => inner.split_at(1),
        _ => ("", inner),
    }
}

fn split_marker_end(inner: &str) -> (&str, &str) {
    match inner.chars().last() {
        Some('-' | '+') => inner.split_at(inner.len() - 1),
        _ => (inner, ""),
    }
}

/// Finds the next `{%`, `{{` or `{#`.
fn find_delimiter(source: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    (0..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'{' && matches!(bytes[i + 1], b'%' | b'{' | b'#'))
}

/// Returns the index just past `closer`.
///
/// Quoted strings are skipped inside expressions and statements; comment
/// text is not tokenized by the template engine, so quotes there are plain.
fn find_closer(source: &str, from: usize, closer: &str) -> Option<usize> {
    if closer == "#}" {
        return source[from..].find(closer).map(|i| from + i + closer.len());
    }

    let bytes = source.as_bytes();
    let closer = closer.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = from;

    while i < bytes.len() {
        let byte = bytes[i];
        match (quote, byte) {
            (Some(_), b'\\') => i += 1,
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, _) if bytes[i..].starts_with(closer) => return Some(i + closer.len()),
            (None, _) => {}
        }
        i += 1;
    }

    None
}

/// Returns the index where the `{% endraw %}` tag following `from` starts.
fn find_endraw(source: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while let Some(offset) = source[pos..].find("{%") {
        let start = pos + offset;
        let end = find_closer(source, start + 2, "%}")?;
        if BlockTag::parse(&source[start..end]).keyword == "endraw" {
            return Some(start);
        }
        pos = end;
    }
    None
}

fn line_number(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

/// Formats a string as a template string literal.
fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            _ => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

fn list_literal(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|item| string_literal(item)).collect();
    format!("[{}]", items.join(", "))
}

fn map_literal(map: &BTreeMap<String, Vec<String>>) -> String {
    let entries: Vec<String> = map
        .iter()
        .map(|(key, values)| format!("{}: {}", string_literal(key), list_literal(values)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
