//! Code block highlighting for the `codehilite` extension.

use std::ops::Range;
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::Result;
use crate::util::decode_entities;

/// Opening tag comrak emits for fenced code with an info string.
const CODE_OPEN: &str = "<code class=\"language-";
const CODE_CLOSE: &str = "</code>";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hljs-" };

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Fenced code block located in comrak output.
struct CodeBlock<'a> {
    language: &'a str,
    /// Byte range of the escaped code between the tags.
    content: Range<usize>,
}

/// Replaces fenced code block content with highlighted spans.
///
/// Blocks in languages syntect does not know keep their escaped text. The
/// spans survive sanitization only when `span` and its `class` attribute
/// are allowed.
///
/// # Errors
///
/// Returns error if syntect fails on a line
pub fn highlight_code_blocks(html: &str) -> Result<String> {
    let mut result = String::with_capacity(html.len());
    let mut copied = 0;

    while let Some(block) = find_code_block(html, copied) {
        let escaped = &html[block.content.clone()];
        result.push_str(&html[copied..block.content.start]);

        match find_syntax(block.language) {
            Some(syntax) => result.push_str(&highlight(syntax, &decode_entities(escaped))?),
            None => result.push_str(escaped),
        }

        copied = block.content.end;
    }

    result.push_str(&html[copied..]);
    Ok(result)
}

fn find_code_block(html: &str, from: usize) -> Option<CodeBlock<'_>> {
    let language_start = from + html[from..].find(CODE_OPEN)? + CODE_OPEN.len();
    let language_end = language_start + html[language_start..].find('"')?;
    let content_start = language_end + html[language_end..].find('>')? + 1;
    let content_end = content_start + html[content_start..].find(CODE_CLOSE)?;

    Some(CodeBlock {
        language: &html[language_start..language_end],
        content: content_start..content_end,
    })
}

fn find_syntax(language: &str) -> Option<&'static SyntaxReference> {
    let syntaxes: &'static SyntaxSet = &SYNTAX_SET;
    syntaxes
        .find_syntax_by_token(language)
        .or_else(|| syntaxes.find_syntax_by_extension(language))
}

fn highlight(syntax: &SyntaxReference, code: &str) -> Result<String> {
    if code.is_empty() {
        return Ok(String::new());
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}
