//! Plugin configuration read from host metadata.
//!
//! Metadata nests plugin configuration at three levels: global, per database
//! and per table. Lookups merge the levels key by key, most specific first.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

use crate::markdown::RenderOptions;

/// Column pattern applied when configuration does not name any patterns.
pub const DEFAULT_PATTERN: &str = "*_markdown";

/// Configuration for a single metadata level.
///
/// Every field is optional so that levels can be merged per key. A missing
/// `patterns` entry means "use [`DEFAULT_PATTERN`]", while an empty list
/// disables pattern matching altogether.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PluginSettings {
    /// Column names that are always rendered.
    pub columns: Option<Vec<String>>,
    /// Glob patterns matched against column names.
    pub patterns: Option<Vec<String>>,
    /// Markdown extension names.
    pub extensions: Option<Vec<String>>,
    /// Tags allowed on top of the base allow-list.
    pub extra_tags: Option<Vec<String>>,
    /// Attributes allowed on top of the base allow-list, keyed by tag.
    pub extra_attrs: Option<BTreeMap<String, Vec<String>>>,
}

impl PluginSettings {
    /// Column names configured for unconditional rendering.
    pub fn columns(&self) -> &[String] {
        self.columns.as_deref().unwrap_or_default()
    }

    /// Effective column patterns.
    ///
    /// Falls back to [`DEFAULT_PATTERN`] only when no level configured
    /// `patterns`; an explicit empty list stays empty.
    pub fn patterns(&self) -> Vec<&str> {
        match &self.patterns {
            Some(patterns) => patterns.iter().map(String::as_str).collect(),
            None => vec![DEFAULT_PATTERN],
        }
    }

    /// Converter options derived from these settings.
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            extensions: self.extensions.clone().unwrap_or_default(),
            extra_tags: self.extra_tags.clone().unwrap_or_default(),
            extra_attrs: self.extra_attrs.clone().unwrap_or_default(),
        }
    }
}

/// Host metadata document holding plugin configuration.
///
/// Mirrors the JSON layout hosts already use:
///
/// ```json
/// {
///   "plugins": {"cellmark": {"patterns": ["*_md"]}},
///   "databases": {
///     "content": {
///       "plugins": {"cellmark": {"columns": ["body"]}},
///       "tables": {"posts": {"plugins": {"cellmark": {"extensions": ["tables"]}}}}
///     }
///   }
/// }
/// ```
///
/// Unrelated keys are ignored. Plugin configuration is kept as raw JSON and
/// decoded on every lookup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    plugins: BTreeMap<String, Value>,
    #[serde(default)]
    databases: BTreeMap<String, DatabaseMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseMetadata {
    #[serde(default)]
    plugins: BTreeMap<String, Value>,
    #[serde(default)]
    tables: BTreeMap<String, TableMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TableMetadata {
    #[serde(default)]
    plugins: BTreeMap<String, Value>,
}

impl Metadata {
    /// Creates empty metadata with no plugin configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses metadata from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not valid metadata JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads metadata from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata file: {}", path.display()))
    }

    /// Sets global configuration for a plugin.
    pub fn with_global(mut self, plugin: &str, config: Value) -> Self {
        self.plugins.insert(plugin.to_string(), config);
        self
    }

    /// Sets database level configuration for a plugin.
    pub fn with_database(mut self, database: &str, plugin: &str, config: Value) -> Self {
        self.databases
            .entry(database.to_string())
            .or_default()
            .plugins
            .insert(plugin.to_string(), config);
        self
    }

    /// Sets table level configuration for a plugin.
    pub fn with_table(mut self, database: &str, table: &str, plugin: &str, config: Value) -> Self {
        self.databases
            .entry(database.to_string())
            .or_default()
            .tables
            .entry(table.to_string())
            .or_default()
            .plugins
            .insert(plugin.to_string(), config);
        self
    }

    /// Returns merged raw configuration for a plugin.
    ///
    /// Objects found at global, database and table level are merged in that
    /// order, so later levels replace earlier keys. Levels whose value is not
    /// an object are skipped. Returns None when no level configures the plugin.
    pub fn plugin_config(
        &self,
        plugin: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> Option<Map<String, Value>> {
        let db = database.and_then(|name| self.databases.get(name));
        let tbl = db
            .zip(table)
            .and_then(|(db, name)| db.tables.get(name));

        let levels = [
            self.plugins.get(plugin),
            db.and_then(|db| db.plugins.get(plugin)),
            tbl.and_then(|tbl| tbl.plugins.get(plugin)),
        ];

        let mut merged: Option<Map<String, Value>> = None;
        for value in levels.into_iter().flatten() {
            match value {
                Value::Object(map) => merged
                    .get_or_insert_with(Map::new)
                    .extend(map.iter().map(|(k, v)| (k.clone(), v.clone()))),
                other => {
                    tracing::warn!(plugin, value = %other, "Ignoring non-object plugin configuration");
                }
            }
        }

        merged
    }

    /// Returns decoded plugin settings for a database and table.
    ///
    /// Missing configuration yields default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the merged configuration does not decode.
    pub fn plugin_settings(
        &self,
        plugin: &str,
        database: Option<&str>,
        table: Option<&str>,
    ) -> crate::Result<PluginSettings> {
        match self.plugin_config(plugin, database, table) {
            Some(map) => Ok(serde_json::from_value(Value::Object(map))?),
            None => Ok(PluginSettings::default()),
        }
    }
}
