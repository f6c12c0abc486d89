//! Table cell rendering.
//!
//! Decides per cell whether its value is markdown source and renders it when
//! it is. Cells that should not be rendered are declined with `Ok(None)` so
//! the host can fall back to other renderers or plain display.

use glob::Pattern;
use maud::Markup;

use crate::config::{Metadata, PluginSettings};
use crate::markdown::MarkdownRenderer;
use crate::{PLUGIN_NAME, Result};

/// Value of a single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    /// Returns text content, or None for non-text values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(value: Vec<u8>) -> Self {
        CellValue::Blob(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Location of a cell in the host's data.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub value: &'a CellValue,
    pub column: &'a str,
    pub table: Option<&'a str>,
    pub database: Option<&'a str>,
}

/// Returns whether a column should be rendered as markdown.
///
/// True when the column is listed in `columns` or matches one of the
/// effective patterns. Patterns use shell glob rules: `*`, `?` and `[seq]`,
/// case sensitive, with `*` also matching `/`.
pub fn should_convert(column: &str, settings: &PluginSettings) -> bool {
    if settings.columns().iter().any(|c| c == column) {
        return true;
    }

    settings
        .patterns()
        .into_iter()
        .any(|pattern| matches_pattern(column, pattern))
}

/// Matches a column name against a glob, comparing literally when the glob
/// does not compile.
fn matches_pattern(column: &str, pattern: &str) -> bool {
    match Pattern::new(&collapse_stars(pattern)) {
        Ok(glob) => glob.matches(column),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid column pattern, comparing literally");
            column == pattern
        }
    }
}

/// Folds runs of `*` into one, since `glob` only accepts `**` as a whole
/// path component and a single star already crosses `/`.
fn collapse_stars(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c != '*' || !collapsed.ends_with('*') {
            collapsed.push(c);
        }
    }
    collapsed
}

/// Renders a cell as markdown when its column is flagged.
///
/// Configuration is resolved from metadata on every call: table settings
/// override database settings, which override global settings, per key.
///
/// # Arguments
///
/// * `cell`: Cell value and location
/// * `metadata`: Host metadata holding plugin configuration
///
/// # Returns
///
/// Rendered markup, or None when the cell is not text or its column is not
/// flagged
///
/// # Errors
///
/// Returns error if configuration does not decode, an extension is unknown,
/// or highlighting fails
pub fn render_cell(cell: &Cell<'_>, metadata: &Metadata) -> Result<Option<Markup>> {
    let Some(text) = cell.value.as_text() else {
        return Ok(None);
    };

    let settings = metadata.plugin_settings(PLUGIN_NAME, cell.database, cell.table)?;

    if !should_convert(cell.column, &settings) {
        return Ok(None);
    }

    tracing::debug!(
        column = cell.column,
        table = cell.table,
        database = cell.database,
        "Rendering markdown cell"
    );

    let options = settings.render_options();
    let markup = MarkdownRenderer::new(&options)?.render(Some(text))?;

    Ok(Some(markup))
}
