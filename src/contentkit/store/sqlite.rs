//! # Database Storage
//!
//! Stores one row per content key in an SQLite table: a key column plus one
//! column per content part. Example schema:
//!
//! ```sql
//! CREATE TABLE page (
//!     id    TEXT NOT NULL,
//!     title TEXT,
//!     body  TEXT,
//!     PRIMARY KEY (id)
//! );
//! ```
//!
//! When `columns` is configured only those columns are read as content parts,
//! otherwise every column except the key and filter columns is. `NULL` reads
//! as an empty string.
//!
//! A [`StorageFilter`] adds its columns to every predicate and to inserted
//! rows, which lets several storages share one table.
//!
//! The table is created on the first write if it does not exist yet. Without
//! configured `columns`, a write also adds any content column the table lacks.
//! Reads from a missing table find nothing.

use super::filter::StorageFilter;
use super::{content_fields, Storage};
use crate::error::{ContentError, Result};
use crate::model::Fields;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DEFAULT_KEY_COLUMN: &str = "id";

pub struct DbStorage {
    conn: Mutex<Connection>,
    table: String,
    key_column: String,
    columns: Vec<String>,
    filter: StorageFilter,
}

impl DbStorage {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn, table))
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, table))
    }

    pub fn from_connection(conn: Connection, table: &str) -> Self {
        Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            columns: Vec::new(),
            filter: StorageFilter::none(),
        }
    }

    pub fn with_key_column(mut self, key_column: &str) -> Self {
        self.key_column = key_column.to_string();
        self
    }

    /// Restricts the content parts to the given columns.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: StorageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Creates the table if missing: key, filter and content columns, all TEXT.
    ///
    /// Content columns come from `with_columns`, or from `content_columns` when
    /// none were configured.
    pub fn create_table(&self, content_columns: &[&str]) -> Result<()> {
        let content: Vec<String> = content_columns.iter().map(|c| c.to_string()).collect();
        self.lock().execute_batch(&self.create_table_sql(&content))?;
        Ok(())
    }

    fn create_table_sql(&self, content_columns: &[String]) -> String {
        let mut identity = vec![self.key_column.clone()];
        identity.extend(
            self.filter
                .attributes()
                .into_keys()
                .filter(|name| *name != self.key_column),
        );

        let content: Vec<String> = if self.columns.is_empty() {
            content_columns.to_vec()
        } else {
            self.columns.clone()
        };

        let mut defs: Vec<String> = identity
            .iter()
            .map(|c| format!("{} TEXT NOT NULL", quote_ident(c)))
            .collect();
        defs.extend(
            content
                .iter()
                .filter(|c| !identity.contains(c))
                .map(|c| format!("{} TEXT", quote_ident(c))),
        );
        let primary_key: Vec<String> = identity.iter().map(|c| quote_ident(c)).collect();
        defs.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.table),
            defs.join(", ")
        )
    }

    fn table_exists(&self, conn: &Connection) -> Result<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [&self.table],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Makes room for `content` before a write. A missing table is created;
    /// without configured columns, unknown content columns are added.
    fn ensure_schema(&self, conn: &Connection, content: &Fields) -> Result<()> {
        let names: Vec<String> = content.keys().cloned().collect();
        if !self.table_exists(conn)? {
            conn.execute_batch(&self.create_table_sql(&names))?;
            tracing::debug!("Created content table {}", self.table);
            return Ok(());
        }
        if !self.columns.is_empty() {
            return Ok(());
        }

        let existing: Vec<String> = {
            let mut stmt =
                conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&self.table)))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
            let names = rows.collect::<std::result::Result<Vec<_>, _>>()?;
            names
        };
        for name in names.iter().filter(|n| !existing.contains(n)) {
            conn.execute_batch(&format!(
                "ALTER TABLE {} ADD COLUMN {} TEXT",
                quote_ident(&self.table),
                quote_ident(name)
            ))?;
            tracing::debug!("Added column {} to content table {}", name, self.table);
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn key_condition(&self, key: &str) -> Fields {
        let mut condition = Fields::new();
        condition.insert(self.key_column.clone(), key.to_string());
        self.filter.compose(condition)
    }

    fn select_list(&self, with_key: bool) -> String {
        if self.columns.is_empty() {
            return "*".to_string();
        }
        let mut columns: Vec<String> = Vec::new();
        if with_key {
            columns.push(quote_ident(&self.key_column));
        }
        columns.extend(self.columns.iter().map(|c| quote_ident(c)));
        columns.join(", ")
    }

    /// Reads the content parts of a row, skipping key and filter columns.
    fn row_fields(&self, row: &Row<'_>, names: &[String], filter: &Fields) -> Result<Fields> {
        let mut fields = Fields::new();
        for (idx, name) in names.iter().enumerate() {
            if *name == self.key_column || filter.contains_key(name) {
                continue;
            }
            fields.insert(name.clone(), value_to_string(row.get_ref(idx)?));
        }
        Ok(fields)
    }

    fn write_row(&self, key: &str, fields: &Fields) -> Result<()> {
        let condition = self.key_condition(key);
        let table = quote_ident(&self.table);
        let (where_sql, where_values) = where_clause(&condition, 1);

        let content = content_fields(fields, &condition);
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        self.ensure_schema(&tx, &content)?;

        let exists = tx
            .query_row(
                &format!("SELECT 1 FROM {} WHERE {} LIMIT 1", table, where_sql),
                params_from_iter(where_values.iter()),
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        if exists {
            if !content.is_empty() {
                let assignments: Vec<String> = content
                    .keys()
                    .enumerate()
                    .map(|(i, name)| format!("{} = ?{}", quote_ident(name), i + 1))
                    .collect();
                let (where_sql, where_values) = where_clause(&condition, content.len() + 1);
                let values: Vec<&String> = content.values().chain(where_values.iter()).collect();
                tx.execute(
                    &format!(
                        "UPDATE {} SET {} WHERE {}",
                        table,
                        assignments.join(", "),
                        where_sql
                    ),
                    params_from_iter(values),
                )?;
            }
        } else {
            let mut row = content;
            row.extend(condition);
            let columns: Vec<String> = row.keys().map(|c| quote_ident(c)).collect();
            let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{}", i)).collect();
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    placeholders.join(", ")
                ),
                params_from_iter(row.values()),
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl Storage for DbStorage {
    fn save(&self, key: &str, fields: &Fields) -> Result<()> {
        self.write_row(key, fields)
            .map_err(|e| ContentError::write(key, e))?;
        tracing::debug!("Saved content row {} in table {}", key, self.table);
        Ok(())
    }

    fn find(&self, key: &str) -> Result<Option<Fields>> {
        let condition = self.key_condition(key);
        let filter = self.filter.attributes();
        let (where_sql, where_values) = where_clause(&condition, 1);

        let conn = self.lock();
        if !self.table_exists(&conn)? {
            return Ok(None);
        }
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE {} LIMIT 1",
            self.select_list(false),
            quote_ident(&self.table),
            where_sql
        ))?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt.query(params_from_iter(where_values.iter()))?;
        let fields = match rows.next()? {
            Some(row) => Some(self.row_fields(row, &names, &filter)?),
            None => None,
        };
        Ok(fields)
    }

    fn find_all(&self) -> Result<BTreeMap<String, Fields>> {
        let filter = self.filter.attributes();
        let table = quote_ident(&self.table);
        let select = self.select_list(true);
        let sql = if filter.is_empty() {
            format!("SELECT {} FROM {}", select, table)
        } else {
            let (where_sql, _) = where_clause(&filter, 1);
            format!("SELECT {} FROM {} WHERE {}", select, table, where_sql)
        };

        let conn = self.lock();
        if !self.table_exists(&conn)? {
            return Ok(BTreeMap::new());
        }
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let key_idx = names
            .iter()
            .position(|n| *n == self.key_column)
            .ok_or_else(|| {
                ContentError::Store(format!(
                    "Table {} has no key column {}",
                    self.table, self.key_column
                ))
            })?;

        let mut records = BTreeMap::new();
        let mut rows = stmt.query(params_from_iter(filter.values()))?;
        while let Some(row) = rows.next()? {
            let key = value_to_string(row.get_ref(key_idx)?);
            records.insert(key, self.row_fields(row, &names, &filter)?);
        }
        Ok(records)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let condition = self.key_condition(key);
        let (where_sql, where_values) = where_clause(&condition, 1);
        let conn = self.lock();
        if !self.table_exists(&conn)? {
            return Ok(());
        }
        conn.execute(
            &format!("DELETE FROM {} WHERE {}", quote_ident(&self.table), where_sql),
            params_from_iter(where_values.iter()),
        )
        .map_err(|e| ContentError::write(key, e))?;
        Ok(())
    }
}

/// Builds `a = ?n AND b = ?n+1 ...` numbering parameters from `first`.
fn where_clause(condition: &Fields, first: usize) -> (String, Vec<String>) {
    let sql = condition
        .keys()
        .enumerate()
        .map(|(i, name)| format!("{} = ?{}", quote_ident(name), first + i))
        .collect::<Vec<_>>()
        .join(" AND ");
    (sql, condition.values().cloned().collect())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
