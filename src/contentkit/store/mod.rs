//! # Storage Layer
//!
//! This module defines the storage abstraction for contentkit. The [`Storage`]
//! trait persists a flat map of named string fields per content key, and every
//! backend must honor the same contract so a [`Manager`](crate::manager::Manager)
//! can use any of them as either its source or its override storage.
//!
//! ## The Contract
//!
//! - `save(key, fields)`: upsert. A missing record is created with `fields` plus
//!   the key. An existing record gets the supplied fields overwritten; fields
//!   that are persisted but not supplied keep their old values.
//!   Supplied fields named like the key field or a filter attribute are
//!   dropped; a save can never move or re-partition a record.
//! - `find(key)`: the record's fields without the key field, or `Ok(None)`.
//!   "No record" is not an error, and it is distinct from a record whose
//!   values are empty.
//! - `find_all()`: every record, keyed by content key.
//! - `delete(key)`: removes the record; deleting a missing key is a no-op.
//!
//! Writes must be atomic per key: a concurrent `find` never observes a
//! half-written record. Each backend gets there its own way (SQLite statement
//! atomicity, a locked map, write-to-tmp-then-rename).
//!
//! ## Implementations
//!
//! - [`memory::MemStorage`]: in-memory document collection, one document per key
//!   with the key embedded in a key field. Used heavily by tests.
//! - [`file::FileStorage`]: one file per key below a root directory, in JSON
//!   ([`file::JsonStorage`]) or TOML ([`file::TomlStorage`]).
//! - [`sqlite::DbStorage`]: one row per key in an SQLite table.
//!
//! ## Filters
//!
//! Table and collection backends can partition one physical store between
//! several logical storages through a [`StorageFilter`]. See [`filter`].
//!
//! ## Storage Layout
//!
//! For `FileStorage`:
//! ```text
//! <root>/
//! ├── about.json          # key "about"
//! └── mail/
//!     └── welcome.json    # key "mail/welcome"
//! ```

use crate::error::Result;
use crate::model::Fields;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod file;
pub mod filter;
pub mod memory;
pub mod sqlite;

pub use filter::StorageFilter;

/// Abstract interface for content storage.
///
/// Methods take `&self`; implementations handle their own interior
/// mutability so a storage can be shared between managers and threads.
pub trait Storage: Send + Sync {
    /// Create or update the record for `key`.
    fn save(&self, key: &str, fields: &Fields) -> Result<()>;

    /// Read the record for `key`.
    /// Returns Ok(None) if there is no record.
    fn find(&self, key: &str) -> Result<Option<Fields>>;

    /// Read every record, keyed by content key.
    fn find_all(&self) -> Result<BTreeMap<String, Fields>>;

    /// Remove the record for `key`, if any.
    fn delete(&self, key: &str) -> Result<()>;
}

/// `fields` without the names used by `condition` (key field and filter
/// attributes).
pub(crate) fn content_fields(fields: &Fields, condition: &Fields) -> Fields {
    fields
        .iter()
        .filter(|(name, _)| !condition.contains_key(*name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn save(&self, key: &str, fields: &Fields) -> Result<()> {
        (**self).save(key, fields)
    }

    fn find(&self, key: &str) -> Result<Option<Fields>> {
        (**self).find(key)
    }

    fn find_all(&self) -> Result<BTreeMap<String, Fields>> {
        (**self).find_all()
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn save(&self, key: &str, fields: &Fields) -> Result<()> {
        (**self).save(key, fields)
    }

    fn find(&self, key: &str) -> Result<Option<Fields>> {
        (**self).find(key)
    }

    fn find_all(&self) -> Result<BTreeMap<String, Fields>> {
        (**self).find_all()
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}
