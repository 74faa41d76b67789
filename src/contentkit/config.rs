//! # Configuration
//!
//! A [`Manager`] can be assembled from a `contentkit.toml` file using
//! [`confique`], layered with `CONTENTKIT_*` environment variables.
//!
//! ## Sample File
//!
//! ```toml
//! renderer = "placeholder"
//! meta_data_fields = ["placeholders"]
//!
//! [render_data]
//! app_name = "My App"
//!
//! [source]
//! kind = "json"
//! path = "content"
//!
//! [overrides]
//! kind = "sqlite"
//! path = "content.db"
//! table = "content"
//! columns = ["title", "body"]
//! ```
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `renderer` | `placeholder` | `placeholder` (`{name}`), `mustache` (`{{a.b}}`) or `template` |
//! | `meta_data_fields` | `[]` | Parts read from the source only |
//! | `render_data` | none | Default render variables |
//! | `<storage>.kind` | `memory` | `json`, `toml`, `sqlite` or `memory` |
//! | `<storage>.path` | none | Root directory, or database file |
//! | `<storage>.table` | `content` | SQLite table |
//! | `<storage>.key_field` | `id` | Key column (sqlite) or document field (memory) |
//! | `<storage>.columns` | none | SQLite content columns |
//! | `<storage>.filter` | none | Fixed attributes partitioning shared storage (sqlite, memory) |
//!
//! `<storage>` is `source` or `overrides`.
//!
//! File storages address records by path, so `table` and `key_field` do not
//! apply to them. Setting `columns` or `filter` on a storage that cannot honor
//! it is a configuration error.

use crate::error::{ContentError, Result};
use crate::manager::Manager;
use crate::model::{Fields, RenderData};
use crate::render::{MustacheRenderer, PlaceholderRenderer, Renderer, TemplateRenderer};
use crate::store::file::{JsonStorage, TomlStorage};
use crate::store::memory::MemStorage;
use crate::store::sqlite::DbStorage;
use crate::store::{Storage, StorageFilter};
use confique::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "contentkit.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Json,
    Toml,
    Sqlite,
    #[default]
    Memory,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Placeholder,
    Mustache,
    Template,
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    #[config(default = "memory")]
    pub kind: StorageKind,

    /// Root directory for file storages, database file for sqlite.
    pub path: Option<PathBuf>,

    #[config(default = "content")]
    pub table: String,

    #[config(default = "id")]
    pub key_field: String,

    pub columns: Option<Vec<String>>,

    pub filter: Option<HashMap<String, String>>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            path: None,
            table: "content".to_string(),
            key_field: "id".to_string(),
            columns: None,
            filter: None,
        }
    }
}

/// Configuration for contentkit, stored in `contentkit.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentConfig {
    #[config(nested)]
    pub source: StorageConfig,

    #[config(nested)]
    pub overrides: StorageConfig,

    #[config(env = "CONTENTKIT_RENDERER", default = "placeholder")]
    pub renderer: RendererKind,

    #[config(default = [])]
    pub meta_data_fields: Vec<String>,

    pub render_data: Option<HashMap<String, String>>,
}

impl ContentConfig {
    /// Loads environment overrides on top of the file at `path`. A missing
    /// file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::builder()
            .env()
            .file(path)
            .load()
            .map_err(|e| ContentError::Config(e.to_string()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Relative storage paths resolved against `base` (the config file's directory).
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for storage in [&mut self.source, &mut self.overrides] {
            if let Some(path) = storage.path.take() {
                storage.path = Some(if path.is_relative() {
                    base.join(path)
                } else {
                    path
                });
            }
        }
        self
    }

    pub fn default_render_data(&self) -> RenderData {
        self.render_data
            .iter()
            .flatten()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect()
    }
}

pub fn build_storage(config: &StorageConfig) -> Result<Box<dyn Storage>> {
    reject_unsupported(config)?;
    let filter = match &config.filter {
        Some(attrs) if !attrs.is_empty() => StorageFilter::new(
            attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Fields>(),
        ),
        _ => StorageFilter::none(),
    };

    let storage: Box<dyn Storage> = match config.kind {
        StorageKind::Json => Box::new(JsonStorage::new(require_path(config)?)),
        StorageKind::Toml => Box::new(TomlStorage::new(require_path(config)?)),
        StorageKind::Sqlite => {
            let db = match &config.path {
                Some(path) => DbStorage::open(path, &config.table)?,
                None => DbStorage::open_in_memory(&config.table)?,
            };
            let mut db = db.with_key_column(&config.key_field).with_filter(filter);
            if let Some(columns) = &config.columns {
                db = db.with_columns(columns.iter().cloned());
                db.create_table(&[])?;
            }
            Box::new(db)
        }
        StorageKind::Memory => Box::new(
            MemStorage::new()
                .with_key_field(&config.key_field)
                .with_filter(filter),
        ),
    };
    Ok(storage)
}

pub fn build_renderer(kind: RendererKind) -> Box<dyn Renderer> {
    match kind {
        RendererKind::Placeholder => Box::new(PlaceholderRenderer),
        RendererKind::Mustache => Box::new(MustacheRenderer),
        RendererKind::Template => Box::new(TemplateRenderer::new()),
    }
}

pub fn build_manager(config: &ContentConfig) -> Result<Manager> {
    let source = build_storage(&config.source)?;
    let overrides = build_storage(&config.overrides)?;
    Ok(Manager::builder(source, overrides)
        .boxed_renderer(build_renderer(config.renderer))
        .meta_data_fields(config.meta_data_fields.iter().cloned())
        .default_render_data(config.default_render_data())
        .build())
}

fn reject_unsupported(config: &StorageConfig) -> Result<()> {
    let unsupported = match config.kind {
        StorageKind::Json | StorageKind::Toml => {
            if config.columns.is_some() {
                Some("columns")
            } else if config.filter.is_some() {
                Some("filter")
            } else {
                None
            }
        }
        StorageKind::Memory if config.columns.is_some() => Some("columns"),
        _ => None,
    };
    match unsupported {
        Some(setting) => Err(ContentError::Config(format!(
            "{:?} storage does not support '{}'",
            config.kind, setting
        ))),
        None => Ok(()),
    }
}

fn require_path(config: &StorageConfig) -> Result<PathBuf> {
    config
        .path
        .clone()
        .ok_or_else(|| ContentError::Config(format!("{:?} storage requires a path", config.kind)))
}
