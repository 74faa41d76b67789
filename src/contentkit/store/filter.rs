//! # Storage Filters
//!
//! A filter adds fixed conditions to every read, write and delete a storage
//! performs, so several logical storages can share one table or collection:
//!
//! ```text
//! content table
//! ┌────────┬───────────┬───────┬──────┐
//! │ id     │ group     │ title │ body │
//! ├────────┼───────────┼───────┼──────┤
//! │ about  │ frontend  │ ...   │ ...  │   <- DbStorage with filter {group: frontend}
//! │ about  │ backend   │ ...   │ ...  │   <- DbStorage with filter {group: backend}
//! └────────┴───────────┴───────┴──────┘
//! ```
//!
//! The filter is a [`Supplier`], so it can be computed per call (for example
//! from the current tenant). When a filter column collides with the base
//! condition (usually the key field), the filter's value wins.

use crate::model::{Fields, Supplier};

#[derive(Debug, Clone, Default)]
pub struct StorageFilter {
    filter: Option<Supplier<Fields>>,
}

impl StorageFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(filter: impl Into<Supplier<Fields>>) -> Self {
        Self {
            filter: Some(filter.into()),
        }
    }

    pub fn is_set(&self) -> bool {
        self.filter.is_some()
    }

    /// Current filter attributes, evaluating a callback filter.
    pub fn attributes(&self) -> Fields {
        self.filter
            .as_ref()
            .map(Supplier::resolve)
            .unwrap_or_default()
    }

    /// Combines `base` with the filter attributes. Filter values win on collision.
    pub fn compose(&self, base: Fields) -> Fields {
        let mut result = base;
        result.extend(self.attributes());
        result
    }
}
