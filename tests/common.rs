//! Shared test utilities for integration tests.
//!
//! Provides helpers for writing metadata files and template directories to
//! temporary locations, and for building template environments with the
//! plugin's extensions registered.

#![allow(dead_code)]

use anyhow::Result;
use cellmark::template::markdown_loader;
use cellmark::markdown::CONTAINER_STYLE;
use cellmark::{MarkdownPlugin, Metadata, Plugin};
use minijinja::Environment;
use std::path::PathBuf;
use tempfile::TempDir;

/// Wraps an expected HTML fragment in the block container.
pub fn wrap(fragment: &str) -> String {
    format!("<div style=\"{}\">{}</div>", CONTAINER_STYLE, fragment)
}

/// Writes metadata JSON to a temporary file.
///
/// # Returns
///
/// Temporary directory, which must outlive the returned path, and the path
/// of the written file
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_metadata(json: &str) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("metadata.json");
    std::fs::write(&path, json)?;
    Ok((dir, path))
}

/// Parses metadata JSON, failing the test on invalid input.
///
/// # Errors
///
/// Returns error if the document does not parse
pub fn metadata(json: &str) -> Result<Metadata> {
    Ok(Metadata::from_json(json)?)
}

/// Creates environment prepared by the plugin.
pub fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    MarkdownPlugin::new().prepare_environment(&mut env);
    env
}

/// Renders a template loaded from a temporary template directory.
///
/// Templates go through the markdown loader, the way a host loads its
/// template directory.
///
/// # Arguments
///
/// * `files`: Template names and sources to write
/// * `name`: Template to render
///
/// # Errors
///
/// Returns error if writing files, loading, or rendering fails
pub fn render_template(files: &[(&str, &str)], name: &str) -> Result<String> {
    let dir = TempDir::new()?;
    for (file, source) in files {
        std::fs::write(dir.path().join(file), source)?;
    }

    let mut env = environment();
    env.set_loader(markdown_loader(minijinja::path_loader(dir.path())));

    let html = env.get_template(name)?.render(())?;
    Ok(html)
}
