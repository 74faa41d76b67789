//! # Content Manager
//!
//! The manager resolves content items from two storages:
//!
//! - **Source**: read-mostly content provisioned with the application (files
//!   shipped with a deployment, a seeded table). The manager never writes to it.
//! - **Override**: runtime-editable content. Saving an item writes here;
//!   resetting an item deletes its record here.
//!
//! ## Resolution
//!
//! ```text
//! get("about")
//!   ├─ override.find("about") ── Some(fields) ──┐
//!   └─ None → source.find("about")              │
//!         ├─ Some(fields) ──────────────────────┤
//!         └─ None → ItemNotFound                ▼
//!                                     strip meta-data fields → Item
//! ```
//!
//! An override record replaces the source record for its key as a whole.
//! There is no per-field merge: a key is served entirely from the override or
//! entirely from the source.
//!
//! ## Meta-data
//!
//! Fields named in `meta_data_fields` (placeholder descriptions, editor notes)
//! are stripped from every item and only ever read from the source storage via
//! [`Manager::get_meta_data`]. They cannot be overridden.

use crate::error::{ContentError, Result};
use crate::item::Item;
use crate::model::{Fields, RenderData, Supplier};
use crate::render::{PlaceholderRenderer, Renderer};
use crate::store::Storage;
use crate::validation::Rule;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub struct Manager {
    source: Box<dyn Storage>,
    overrides: Box<dyn Storage>,
    renderer: Box<dyn Renderer>,
    meta_data_fields: BTreeSet<String>,
    default_render_data: Supplier<RenderData>,
    item_rules: Option<Supplier<Vec<Rule>>>,
}

impl Manager {
    pub fn builder<S, O>(source: S, overrides: O) -> ManagerBuilder
    where
        S: Storage + 'static,
        O: Storage + 'static,
    {
        ManagerBuilder {
            source: Box::new(source),
            overrides: Box::new(overrides),
            renderer: Box::new(PlaceholderRenderer),
            meta_data_fields: BTreeSet::new(),
            default_render_data: Supplier::default(),
            item_rules: None,
        }
    }

    /// Returns the item for `id`, preferring its override record.
    pub fn get(&self, id: &str) -> Result<Item<'_>> {
        let data = match self.overrides.find(id)? {
            Some(data) => {
                tracing::debug!("Content item {} resolved from override storage", id);
                data
            }
            None => match self.source.find(id)? {
                Some(data) => {
                    tracing::debug!("Content item {} resolved from source storage", id);
                    data
                }
                None => return Err(ContentError::ItemNotFound(id.to_string())),
            },
        };
        Ok(self.create_item(id, data))
    }

    /// Returns every item known to either storage, keyed by id.
    ///
    /// Keys present only in the override storage are included.
    pub fn get_all(&self) -> Result<BTreeMap<String, Item<'_>>> {
        let mut rows = self.source.find_all()?;
        rows.extend(self.overrides.find_all()?);

        Ok(rows
            .into_iter()
            .map(|(id, data)| {
                let item = self.create_item(&id, data);
                (id, item)
            })
            .collect())
    }

    /// Writes `fields` as the override for `id`. No validation happens here.
    pub fn save(&self, id: &str, fields: &Fields) -> Result<()> {
        self.overrides.save(id, fields)?;
        tracing::info!("Saved override for content item {}", id);
        Ok(())
    }

    /// Removes the override for `id`, so the source content shows again.
    pub fn reset(&self, id: &str) -> Result<()> {
        self.overrides.delete(id)?;
        tracing::info!("Reset content item {}", id);
        Ok(())
    }

    /// Meta-data fields of `id`, read from the source storage only.
    ///
    /// Empty when no meta-data fields are declared or the source has no record.
    pub fn get_meta_data(&self, id: &str) -> Result<Fields> {
        if self.meta_data_fields.is_empty() {
            return Ok(Fields::new());
        }

        let Some(data) = self.source.find(id)? else {
            return Ok(Fields::new());
        };

        Ok(data
            .into_iter()
            .filter(|(name, _)| self.meta_data_fields.contains(name))
            .collect())
    }

    /// Default render data merged with `extra`; `extra` wins on collision.
    pub fn render_data(&self, extra: &RenderData) -> RenderData {
        let mut data = self.default_render_data.resolve();
        data.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        data
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn source_storage(&self) -> &dyn Storage {
        self.source.as_ref()
    }

    pub fn override_storage(&self) -> &dyn Storage {
        self.overrides.as_ref()
    }

    pub fn meta_data_fields(&self) -> &BTreeSet<String> {
        &self.meta_data_fields
    }

    pub fn is_meta_data_field(&self, name: &str) -> bool {
        self.meta_data_fields.contains(name)
    }

    /// Rules applied to items that carry no rules of their own.
    pub(crate) fn item_rules(&self) -> Option<Vec<Rule>> {
        self.item_rules.as_ref().map(Supplier::resolve)
    }

    fn create_item(&self, id: &str, mut data: Fields) -> Item<'_> {
        data.retain(|name, _| !self.meta_data_fields.contains(name));
        Item::new(self, id, data)
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("meta_data_fields", &self.meta_data_fields)
            .field("default_render_data", &self.default_render_data)
            .finish_non_exhaustive()
    }
}

pub struct ManagerBuilder {
    source: Box<dyn Storage>,
    overrides: Box<dyn Storage>,
    renderer: Box<dyn Renderer>,
    meta_data_fields: BTreeSet<String>,
    default_render_data: Supplier<RenderData>,
    item_rules: Option<Supplier<Vec<Rule>>>,
}

impl ManagerBuilder {
    pub fn renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn boxed_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn meta_data_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta_data_fields = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_render_data(mut self, data: impl Into<Supplier<RenderData>>) -> Self {
        self.default_render_data = data.into();
        self
    }

    /// Validation rules for items; replaces the every-field-required default.
    pub fn item_rules(mut self, rules: impl Into<Supplier<Vec<Rule>>>) -> Self {
        self.item_rules = Some(rules.into());
        self
    }

    pub fn build(self) -> Manager {
        Manager {
            source: self.source,
            overrides: self.overrides,
            renderer: self.renderer,
            meta_data_fields: self.meta_data_fields,
            default_render_data: self.default_render_data,
            item_rules: self.item_rules,
        }
    }
}
