//! Template engine integration.
//!
//! Adds markdown rendering to a minijinja [`Environment`]:
//!
//! * `render_markdown(text, extensions=[], extra_tags=[], extra_attrs={})`
//!   renders a value from inside an expression.
//! * `{% markdown %}...{% endmarkdown %}` renders a block of template
//!   content. The block is compiled by [`preprocess`] into a filter block
//!   calling `markdown_block`, so templates must be added through
//!   [`add_template`] or loaded through [`markdown_loader`].

mod attrs;
mod tag;

use std::collections::BTreeMap;

use minijinja::value::{Kwargs, Value};
use minijinja::{Environment, ErrorKind};

use crate::markdown::{self, RenderOptions};

pub use attrs::{parse_extra_attrs, parse_tag_attributes};
pub use tag::preprocess;

/// Name of the template function rendering a single value.
pub const RENDER_FUNCTION: &str = "render_markdown";

/// Name of the filter `{% markdown %}` blocks compile to.
pub const BLOCK_FILTER: &str = "markdown_block";

/// Compile error of a `{% markdown %}` tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {line})")]
pub struct TemplateSyntaxError {
    /// Error message.
    pub message: String,
    /// One-based line of the offending tag.
    pub line: usize,
}

impl TemplateSyntaxError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }

    fn into_template_error(self, name: &str) -> minijinja::Error {
        minijinja::Error::new(
            ErrorKind::SyntaxError,
            format!("{} in template '{}'", self, name),
        )
        .with_source(self)
    }
}

/// Registers the `render_markdown` function and the `markdown_block` filter.
pub fn register(env: &mut Environment<'_>) {
    env.add_function(RENDER_FUNCTION, render_markdown_function);
    env.add_filter(BLOCK_FILTER, markdown_block_filter);
}

/// Returns the `render_markdown` function as a template value, for hosts that
/// pass it in a render context instead of registering it globally.
pub fn render_function() -> Value {
    Value::from_function(render_markdown_function)
}

/// Compiles markdown blocks in `source` and adds the result to `env`.
///
/// # Arguments
///
/// * `env`: Environment with [`register`] applied
/// * `name`: Template name
/// * `source`: Template source
///
/// # Errors
///
/// Returns a syntax error if a markdown tag is malformed or unclosed, or
/// whatever minijinja reports for the compiled template
pub fn add_template(
    env: &mut Environment<'_>,
    name: &str,
    source: &str,
) -> Result<(), minijinja::Error> {
    let compiled = preprocess(source).map_err(|e| e.into_template_error(name))?;
    env.add_template_owned(name.to_string(), compiled)
}

/// Wraps a template loader so that loaded sources have their markdown
/// blocks compiled.
///
/// ```rust,ignore
/// env.set_loader(markdown_loader(minijinja::path_loader("templates")));
/// ```
pub fn markdown_loader<F>(
    inner: F,
) -> impl Fn(&str) -> Result<Option<String>, minijinja::Error> + Send + Sync + 'static
where
    F: Fn(&str) -> Result<Option<String>, minijinja::Error> + Send + Sync + 'static,
{
    move |name: &str| match inner(name)? {
        Some(source) => {
            tracing::debug!(template = name, "Compiling markdown blocks");
            preprocess(&source)
                .map(Some)
                .map_err(|e| e.into_template_error(name))
        }
        None => Ok(None),
    }
}

fn render_markdown_function(text: Option<String>, kwargs: Kwargs) -> Result<Value, minijinja::Error> {
    let options = options_from_kwargs(&kwargs)?;
    render(text.as_deref(), &options)
}

fn markdown_block_filter(body: String, kwargs: Kwargs) -> Result<Value, minijinja::Error> {
    let options = options_from_kwargs(&kwargs)?;
    render(Some(&body), &options)
}

fn render(text: Option<&str>, options: &RenderOptions) -> Result<Value, minijinja::Error> {
    let markup = markdown::render_markdown(text, options)
        .map_err(|e| minijinja::Error::new(ErrorKind::InvalidOperation, e.to_string()))?;
    Ok(Value::from_safe_string(markup.into_string()))
}

/// Reads `extensions`, `extra_tags` and `extra_attrs` keyword arguments.
///
/// `extra_attrs` is a mapping of tag to attribute names, or a string in the
/// `tag:attr1,attr2` form the block tag uses.
fn options_from_kwargs(kwargs: &Kwargs) -> Result<RenderOptions, minijinja::Error> {
    let extensions: Option<Vec<String>> = kwargs.get("extensions")?;
    let extra_tags: Option<Vec<String>> = kwargs.get("extra_tags")?;
    let extra_attrs: Option<Value> = kwargs.get("extra_attrs")?;
    kwargs.assert_all_used()?;

    Ok(RenderOptions {
        extensions: extensions.unwrap_or_default(),
        extra_tags: extra_tags.unwrap_or_default(),
        extra_attrs: match extra_attrs {
            Some(value) => extra_attrs_from_value(&value)?,
            None => BTreeMap::new(),
        },
    })
}

fn extra_attrs_from_value(value: &Value) -> Result<BTreeMap<String, Vec<String>>, minijinja::Error> {
    let invalid = |detail: String| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("Invalid extra_attrs: {}", detail),
        )
    };

    if let Some(text) = value.as_str() {
        return parse_extra_attrs(text).map_err(invalid);
    }

    let json = serde_json::to_value(value).map_err(|e| invalid(e.to_string()))?;
    serde_json::from_value(json).map_err(|e| invalid(e.to_string()))
}
