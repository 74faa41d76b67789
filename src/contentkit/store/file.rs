//! # File Storage
//!
//! Keeps one file per content key below a root directory. The key's `/` or `\`
//! separators become directories, so `mail/welcome` lives at
//! `<root>/mail/welcome.json`. Directories are created lazily on first write.
//!
//! ## Atomic Writes
//!
//! Records are written to a `.record-<uuid>.tmp` sibling and renamed over the
//! target, so a concurrent reader sees either the old or the new record.
//! Saves merge into the existing record, so writers of one storage are
//! serialized by a lock held from the read to the rename.
//! Temporary files never carry the record extension and are ignored by
//! [`Storage::find_all`].
//!
//! ## Formats
//!
//! The on-disk encoding is pluggable through [`RecordFormat`]:
//! - [`JsonFormat`]: `{"title": "...", "body": "..."}`
//! - [`TomlFormat`]: `title = "..."` lines, convenient for hand-edited source content.
//!
//! Scalar values (numbers, booleans) are accepted on read and turned into
//! strings. Nested values are rejected.

use super::Storage;
use crate::error::{ContentError, Result};
use crate::model::Fields;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

/// Encoding of a single record file.
pub trait RecordFormat: Send + Sync {
    /// File extension including the leading dot.
    const EXTENSION: &'static str;

    fn decode(content: &str) -> Result<Fields>;

    fn encode(fields: &Fields) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl RecordFormat for JsonFormat {
    const EXTENSION: &'static str = ".json";

    fn decode(content: &str) -> Result<Fields> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        map.into_iter()
            .map(|(name, value)| {
                let text = match value {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => {
                        return Err(ContentError::Store(format!(
                            "Field '{}' holds a nested value",
                            name
                        )))
                    }
                };
                Ok((name, text))
            })
            .collect()
    }

    fn encode(fields: &Fields) -> Result<String> {
        Ok(serde_json::to_string_pretty(fields)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl RecordFormat for TomlFormat {
    const EXTENSION: &'static str = ".toml";

    fn decode(content: &str) -> Result<Fields> {
        let table: toml::Table = toml::from_str(content)?;
        table
            .into_iter()
            .map(|(name, value)| {
                let text = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Datetime(d) => d.to_string(),
                    _ => {
                        return Err(ContentError::Store(format!(
                            "Field '{}' holds a nested value",
                            name
                        )))
                    }
                };
                Ok((name, text))
            })
            .collect()
    }

    fn encode(fields: &Fields) -> Result<String> {
        Ok(toml::to_string(fields)?)
    }
}

/// One-file-per-key storage.
pub struct FileStorage<F: RecordFormat> {
    root: PathBuf,
    write_lock: Mutex<()>,
    format: PhantomData<F>,
}

pub type JsonStorage = FileStorage<JsonFormat>;
pub type TomlStorage = FileStorage<TomlFormat>;

impl<F: RecordFormat> FileStorage<F> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
            format: PhantomData,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    ///
    /// Both `/` and `\` count as separators. Empty segments and segments
    /// starting with `.` are rejected: a key can never address a file outside
    /// the root, nor a hidden file that `find_all` would skip.
    pub fn record_path(&self, key: &str) -> Result<PathBuf> {
        let segments: Vec<&str> = key.split(['/', '\\']).collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || s.starts_with('.'))
        {
            return Err(ContentError::InvalidKey(key.to_string()));
        }

        let mut path = self.root.clone();
        let (last, dirs) = segments
            .split_last()
            .ok_or_else(|| ContentError::InvalidKey(key.to_string()))?;
        for dir in dirs {
            path.push(dir);
        }
        path.push(format!("{}{}", last, F::EXTENSION));
        Ok(path)
    }

    fn read_record(&self, path: &Path) -> Result<Fields> {
        let content = fs::read_to_string(path)?;
        F::decode(&content)
    }

    /// Like `read_record`, but a missing file is `Ok(None)`.
    fn read_existing(&self, path: &Path) -> Result<Option<Fields>> {
        match fs::read_to_string(path) {
            Ok(content) => F::decode(&content).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_record(&self, key: &str, path: &Path, fields: &Fields) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| ContentError::InvalidKey(key.to_string()))?;
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| ContentError::write(key, e))?;
        }

        let content = F::encode(fields).map_err(|e| ContentError::write(key, e))?;

        // Atomic Write
        let tmp_path = dir.join(format!(".record-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(|e| ContentError::write(key, e))?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(ContentError::write(key, e));
        }
        Ok(())
    }

    fn collect_records(
        &self,
        dir: &Path,
        prefix: &str,
        records: &mut BTreeMap<String, Fields>,
    ) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                tracing::warn!("Skipping non UTF-8 path {}", path.display());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                let nested = format!("{}{}/", prefix, name);
                self.collect_records(&path, &nested, records)?;
            } else if let Some(stem) = name.strip_suffix(F::EXTENSION) {
                let key = format!("{}{}", prefix, stem);
                let fields = self.read_record(&path)?;
                records.insert(key, fields);
            }
        }
        Ok(())
    }
}

impl<F: RecordFormat> Storage for FileStorage<F> {
    fn save(&self, key: &str, fields: &Fields) -> Result<()> {
        let path = self.record_path(key)?;
        let _guard = self.lock();
        let mut record = self.read_existing(&path)?.unwrap_or_default();
        record.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.write_record(key, &path, &record)?;
        tracing::debug!("Wrote content record {} to {}", key, path.display());
        Ok(())
    }

    fn find(&self, key: &str) -> Result<Option<Fields>> {
        let path = self.record_path(key)?;
        self.read_existing(&path)
    }

    fn find_all(&self) -> Result<BTreeMap<String, Fields>> {
        let mut records = BTreeMap::new();
        if !self.root.exists() {
            return Ok(records);
        }
        self.collect_records(&self.root, "", &mut records)?;
        Ok(records)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;
        let _guard = self.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ContentError::write(key, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fields;
    use tempfile::TempDir;

    #[test]
    fn test_record_path_nests_separators() {
        let storage = JsonStorage::new("/data");
        assert_eq!(
            storage.record_path("mail/welcome").unwrap(),
            Path::new("/data").join("mail").join("welcome.json")
        );
        assert_eq!(
            storage.record_path("mail\\welcome").unwrap(),
            Path::new("/data").join("mail").join("welcome.json")
        );
    }

    #[test]
    fn test_record_path_rejects_escapes() {
        let storage = TomlStorage::new("/data");
        for key in ["", "../etc/passwd", "a//b", "a/./b", "a/", ".draft", "mail/.hidden"] {
            assert!(
                matches!(storage.record_path(key), Err(ContentError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_json_decode_scalars() {
        let decoded =
            JsonFormat::decode(r#"{"title": "T", "count": 3, "flag": true, "none": null}"#)
                .unwrap();
        assert_eq!(
            decoded,
            fields([("title", "T"), ("count", "3"), ("flag", "true"), ("none", "")])
        );
    }

    #[test]
    fn test_json_decode_rejects_nested() {
        assert!(JsonFormat::decode(r#"{"title": {"a": 1}}"#).is_err());
    }

    #[test]
    fn test_toml_decode() {
        let decoded = TomlFormat::decode("title = \"T\"\nweight = 2\n").unwrap();
        assert_eq!(decoded, fields([("title", "T"), ("weight", "2")]));
    }

    #[test]
    fn test_save_merges_into_existing_file() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path());
        storage
            .save("about", &fields([("title", "T"), ("body", "B")]))
            .unwrap();
        storage.save("about", &fields([("title", "T2")])).unwrap();

        assert_eq!(
            storage.find("about").unwrap(),
            Some(fields([("title", "T2"), ("body", "B")]))
        );
    }

    #[test]
    fn test_hidden_keys_are_not_stored() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path());
        for key in [".draft", "mail/.hidden"] {
            assert!(matches!(
                storage.save(key, &fields([("title", "T")])),
                Err(ContentError::InvalidKey(_))
            ));
        }
        storage.save("about", &fields([("title", "T")])).unwrap();

        let all = storage.find_all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["about"]);
        assert!(!dir.path().join(".draft.json").exists());
    }

    #[test]
    fn test_find_all_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        let storage = TomlStorage::new(dir.path());
        storage.save("a", &fields([("title", "A")])).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join(".record-x.tmp"), "ignored").unwrap();

        let all = storage.find_all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_find_all_missing_root() {
        let dir = TempDir::new().unwrap();
        let storage = JsonStorage::new(dir.path().join("not-created"));
        assert!(storage.find_all().unwrap().is_empty());
        assert!(!storage.root().exists());
    }
}
