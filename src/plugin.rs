//! Host hooks.
//!
//! A host drives the plugin through three hooks: cell rendering, extra
//! template variables, and template environment preparation.

use maud::Markup;
use minijinja::Environment;
use minijinja::value::Value;

use crate::cell::{self, Cell};
use crate::config::Metadata;
use crate::template;
use crate::{PLUGIN_NAME, Result};

/// Hooks a host calls into.
pub trait Plugin {
    /// Key under which the plugin's configuration lives in metadata.
    fn name(&self) -> &'static str;

    /// Renders a cell, or declines with `Ok(None)` so the host falls back
    /// to its default display.
    fn render_cell(&self, cell: &Cell<'_>, metadata: &Metadata) -> Result<Option<Markup>>;

    /// Variables added to every template render context.
    fn extra_template_vars(&self) -> Vec<(&'static str, Value)> {
        Vec::new()
    }

    /// Registers functions, filters and tests on the host environment.
    fn prepare_environment(&self, _env: &mut Environment<'_>) {}
}

/// Markdown rendering for flagged cells and templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownPlugin;

impl MarkdownPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Plugin for MarkdownPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn render_cell(&self, cell: &Cell<'_>, metadata: &Metadata) -> Result<Option<Markup>> {
        cell::render_cell(cell, metadata)
    }

    fn extra_template_vars(&self) -> Vec<(&'static str, Value)> {
        vec![(template::RENDER_FUNCTION, template::render_function())]
    }

    fn prepare_environment(&self, env: &mut Environment<'_>) {
        tracing::debug!(plugin = PLUGIN_NAME, "Registering template extensions");
        template::register(env);
    }
}
