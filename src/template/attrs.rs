//! Attribute parsing for the `{% markdown %}` tag.
//!
//! Attributes are `name="value"` triples. Values are literal strings; the
//! `extra_attrs` value uses its own `tag:attr1,attr2 tag2:attr3` syntax.

use std::collections::BTreeMap;

use crate::markdown::RenderOptions;

/// Token of a tag's attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Name(&'a str),
    Assign,
    Str(String),
    Other(&'a str),
}

impl Token<'_> {
    /// Token text as shown in error messages.
    fn text(&self) -> &str {
        match self {
            Token::Name(name) => name,
            Token::Assign => "=",
            Token::Str(value) => value,
            Token::Other(text) => text,
        }
    }
}

/// Parses the attribute list following the `markdown` keyword.
///
/// # Errors
///
/// Returns an error message if the list is not a sequence of
/// `name="value"` triples, names an unknown attribute, or holds a malformed
/// `extra_attrs` value.
pub fn parse_tag_attributes(source: &str) -> Result<RenderOptions, String> {
    let tokens = tokenize(source);

    if tokens.len() % 3 != 0 {
        return Err("Invalid syntax for markdown tag".to_string());
    }

    let mut attrs = Vec::with_capacity(tokens.len() / 3);
    for triple in tokens.chunks(3) {
        match triple {
            [Token::Name(name), Token::Assign, Token::Str(value)] => attrs.push((*name, value)),
            _ => {
                let got: String = triple.iter().map(Token::text).collect();
                return Err(format!(
                    "Invalid syntax for markdown attribute - got '{}', should be name=\"value\"",
                    got
                ));
            }
        }
    }

    let mut options = RenderOptions::default();
    for (name, value) in attrs {
        match name {
            "extensions" => options.extensions = split_list(value),
            "extra_tags" => options.extra_tags = split_list(value),
            "extra_attrs" => options.extra_attrs = parse_extra_attrs(value)?,
            other => return Err(format!("Unknown attribute '{}'", other)),
        }
    }

    Ok(options)
}

/// Parses `tag:attr1,attr2 tag2:attr3` into a tag to attributes map.
///
/// Every entry needs exactly one colon, a tag name and at least one
/// attribute name; empty names are rejected. Repeated tags accumulate.
///
/// # Errors
///
/// Returns an error message naming the first malformed entry.
pub fn parse_extra_attrs(value: &str) -> Result<BTreeMap<String, Vec<String>>, String> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for entry in value.split_whitespace() {
        let invalid = || {
            format!(
                "Invalid extra_attrs entry '{}', should be tag:attr1,attr2",
                entry
            )
        };

        let (tag, attrs) = entry.split_once(':').ok_or_else(invalid)?;
        if tag.is_empty() || attrs.contains(':') {
            return Err(invalid());
        }

        let names: Vec<&str> = attrs.split(',').collect();
        if names.iter().any(|name| name.is_empty()) {
            return Err(invalid());
        }

        map.entry(tag.to_string())
            .or_default()
            .extend(names.into_iter().map(String::from));
    }

    Ok(map)
}

fn split_list(value: &str) -> Vec<String> {
    value.split_whitespace().map(String::from).collect()
}

/// Splits an attribute list into tokens.
///
/// Names are identifiers, strings use single or double quotes with
/// backslash escapes. Anything else becomes an `Other` token so that the
/// triple check reports it.
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_alphabetic() || c == '_' {
            let mut end = start;
            while let Some((i, c)) = chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_') {
                end = i + c.len_utf8();
            }
            tokens.push(Token::Name(&source[start..end]));
        } else if c == '=' {
            chars.next();
            if chars.next_if(|&(_, c)| c == '=').is_some() {
                tokens.push(Token::Other("=="));
            } else {
                tokens.push(Token::Assign);
            }
        } else if c == '"' || c == '\'' {
            chars.next();
            let mut value = String::new();
            let mut closed = false;
            while let Some((_, ch)) = chars.next() {
                match ch {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => value.push('\n'),
                        Some((_, 't')) => value.push('\t'),
                        Some((_, escaped)) => value.push(escaped),
                        None => break,
                    },
                    _ if ch == c => {
                        closed = true;
                        break;
                    }
                    _ => value.push(ch),
                }
            }
            if closed {
                tokens.push(Token::Str(value));
            } else {
                tokens.push(Token::Other(&source[start..]));
            }
        } else {
            chars.next();
            let mut end = start + c.len_utf8();
            if c.is_ascii_digit() {
                while let Some((i, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit() || d == '.') {
                    end = i + d.len_utf8();
                }
            }
            tokens.push(Token::Other(&source[start..end]));
        }
    }

    tokens
}
