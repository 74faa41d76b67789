//! # Content Items
//!
//! An [`Item`] is a snapshot of one content key: its resolved fields plus a
//! borrow of the [`Manager`] that produced it. Items own their field data, so
//! two items for the same key never affect each other until one is saved.
//!
//! Typical flow:
//!
//! ```text
//! let mut item = manager.get("about")?;     // resolve override → source
//! item.render("body", &data)?;              // substitute placeholders
//! item.set("title", "New title")?;          // edit in memory
//! item.save(true)?;                         // validate, write override
//! item.reset(true)?;                        // drop override, reload source
//! ```

use crate::error::{ContentError, Result};
use crate::manager::Manager;
use crate::model::{Fields, RenderData, Supplier};
use crate::validation::{self, Rule, ValidationErrors};
use once_cell::unsync::OnceCell;
use std::fmt;

pub struct Item<'m> {
    id: String,
    fields: Fields,
    manager: &'m Manager,
    rules: Option<Supplier<Vec<Rule>>>,
    errors: ValidationErrors,
    meta_data: OnceCell<Fields>,
}

impl<'m> Item<'m> {
    pub(crate) fn new(manager: &'m Manager, id: &str, fields: Fields) -> Self {
        Self {
            id: id.to_string(),
            fields,
            manager,
            rules: None,
            errors: ValidationErrors::default(),
            meta_data: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn manager(&self) -> &'m Manager {
        self.manager
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Value of a content part.
    pub fn get(&self, field: &str) -> Result<&str> {
        self.fields
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| self.field_not_found(field))
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Changes an existing content part. Parts cannot be added this way.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<()> {
        match self.fields.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(self.field_not_found(field)),
        }
    }

    /// Bulk-assigns values for the parts this item has; unknown names are
    /// ignored. Returns whether anything was assigned.
    pub fn set_fields(&mut self, values: Fields) -> bool {
        let mut assigned = false;
        for (name, value) in values {
            if let Some(slot) = self.fields.get_mut(&name) {
                *slot = value;
                assigned = true;
            }
        }
        assigned
    }

    /// Renders a content part with the manager's renderer.
    ///
    /// The manager's default render data is resolved for every call and
    /// merged under `data`, so per-call values win.
    pub fn render(&self, field: &str, data: &RenderData) -> Result<String> {
        let content = self.get(field)?;
        let data = self.manager.render_data(data);
        self.manager.renderer().render(content, &data)
    }

    /// Validation rules for this item only. They replace both the manager's
    /// rules and the every-field-required default.
    pub fn with_rules(mut self, rules: impl Into<Supplier<Vec<Rule>>>) -> Self {
        self.rules = Some(rules.into());
        self
    }

    /// Rules in effect: item rules, else manager rules, else all fields required.
    pub fn rules(&self) -> Vec<Rule> {
        if let Some(rules) = &self.rules {
            return rules.resolve();
        }
        self.manager
            .item_rules()
            .unwrap_or_else(|| validation::default_rules(&self.fields))
    }

    /// Checks the current fields, keeping the errors for [`Item::errors`].
    pub fn validate(&mut self) -> bool {
        self.errors = validation::validate(&self.fields, &self.rules());
        self.errors.is_empty()
    }

    /// Errors from the last [`Item::validate`] call.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Writes all current fields as this item's override.
    ///
    /// Returns `Ok(false)` without writing when validation is requested and fails.
    pub fn save(&mut self, validate: bool) -> Result<bool> {
        if validate && !self.validate() {
            tracing::debug!("Content item {} failed validation, not saved", self.id);
            return Ok(false);
        }
        self.manager.save(&self.id, &self.fields)?;
        Ok(true)
    }

    /// Removes this item's override. With `refresh`, reloads the fields the
    /// manager now resolves for this id.
    ///
    /// Refreshing an item that only existed as an override fails with
    /// [`ContentError::ItemNotFound`] after the override is gone.
    pub fn reset(&mut self, refresh: bool) -> Result<()> {
        self.manager.reset(&self.id)?;
        if refresh {
            let fresh = self.manager.get(&self.id)?;
            self.fields = fresh.into_fields();
        }
        Ok(())
    }

    /// Meta-data for this item, fetched from the source storage on first use.
    pub fn meta_data(&self) -> Result<&Fields> {
        self.meta_data
            .get_or_try_init(|| self.manager.get_meta_data(&self.id))
    }

    fn field_not_found(&self, field: &str) -> ContentError {
        ContentError::FieldNotFound {
            item: self.id.clone(),
            field: field.to_string(),
        }
    }
}

impl fmt::Debug for Item<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
