use super::filter::StorageFilter;
use super::{content_fields, Storage};
use crate::error::{ContentError, Result};
use crate::model::Fields;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

const DEFAULT_KEY_FIELD: &str = "id";

/// In-memory document collection.
///
/// Every record is a document holding its content fields, the content key
/// under `key_field`, and the filter attributes it was written with. This is
/// the same shape a document database collection has, which makes it a
/// faithful stand-in for one in tests.
pub struct MemStorage {
    documents: RwLock<Vec<Fields>>,
    key_field: String,
    filter: StorageFilter,
    simulate_write_error: AtomicBool,
}

impl Default for MemStorage {
    fn default() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            key_field: DEFAULT_KEY_FIELD.to_string(),
            filter: StorageFilter::none(),
            simulate_write_error: AtomicBool::new(false),
        }
    }
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the storage with records, e.g. to act as a source storage.
    pub fn with_records<K, I>(records: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Fields)>,
    {
        let storage = Self::new();
        {
            let mut documents = storage.write_documents();
            for (key, mut fields) in records {
                fields.insert(storage.key_field.clone(), key.into());
                documents.push(fields);
            }
        }
        storage
    }

    pub fn with_key_field(mut self, key_field: &str) -> Self {
        self.key_field = key_field.to_string();
        self
    }

    pub fn with_filter(mut self, filter: StorageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Raw documents, including key and filter fields.
    pub fn documents(&self) -> Vec<Fields> {
        self.read_documents().clone()
    }

    fn read_documents(&self) -> std::sync::RwLockReadGuard<'_, Vec<Fields>> {
        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_documents(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Fields>> {
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn key_condition(&self, key: &str) -> Fields {
        let mut condition = Fields::new();
        condition.insert(self.key_field.clone(), key.to_string());
        self.filter.compose(condition)
    }

    /// Strips the key field and filter attributes from a stored document.
    fn content_of(&self, document: &Fields, filter: &Fields) -> Fields {
        document
            .iter()
            .filter(|(name, _)| **name != self.key_field && !filter.contains_key(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

fn matches(document: &Fields, condition: &Fields) -> bool {
    condition
        .iter()
        .all(|(name, value)| document.get(name) == Some(value))
}

impl Storage for MemStorage {
    fn save(&self, key: &str, fields: &Fields) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(ContentError::write(key, "Simulated write error"));
        }

        let condition = self.key_condition(key);
        let content = content_fields(fields, &condition);
        let mut documents = self.write_documents();
        match documents.iter_mut().find(|doc| matches(doc, &condition)) {
            Some(document) => document.extend(content),
            None => {
                let mut document = content;
                document.extend(condition);
                documents.push(document);
            }
        }
        Ok(())
    }

    fn find(&self, key: &str) -> Result<Option<Fields>> {
        let condition = self.key_condition(key);
        let filter = self.filter.attributes();
        let documents = self.read_documents();
        Ok(documents
            .iter()
            .find(|doc| matches(doc, &condition))
            .map(|doc| self.content_of(doc, &filter)))
    }

    fn find_all(&self) -> Result<BTreeMap<String, Fields>> {
        let filter = self.filter.attributes();
        let documents = self.read_documents();
        Ok(documents
            .iter()
            .filter(|doc| matches(doc, &filter))
            .filter_map(|doc| {
                let key = doc.get(&self.key_field)?.clone();
                Some((key, self.content_of(doc, &filter)))
            })
            .collect())
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(ContentError::write(key, "Simulated write error"));
        }
        let condition = self.key_condition(key);
        self.write_documents().retain(|doc| !matches(doc, &condition));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fields;

    #[test]
    fn test_find_missing_is_none() {
        let storage = MemStorage::new();
        assert_eq!(storage.find("nope").unwrap(), None);
    }

    #[test]
    fn test_document_embeds_key_field() {
        let storage = MemStorage::new().with_key_field("slug");
        storage.save("about", &fields([("title", "About")])).unwrap();

        let docs = storage.documents();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("slug").map(String::as_str), Some("about"));
        assert_eq!(
            storage.find("about").unwrap(),
            Some(fields([("title", "About")]))
        );
    }

    #[test]
    fn test_seeded_records() {
        let storage = MemStorage::with_records([
            ("a", fields([("title", "A")])),
            ("b", fields([("title", "B")])),
        ]);
        let all = storage.find_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["b"], fields([("title", "B")]));
    }

    #[test]
    fn test_filter_isolates_documents() {
        let front = MemStorage::new().with_filter(StorageFilter::new(fields([("group", "front")])));
        front.save("about", &fields([("title", "Front")])).unwrap();
        assert_eq!(front.documents()[0].get("group").map(String::as_str), Some("front"));

        // Same physical collection, different partition
        let back = MemStorage::new().with_filter(StorageFilter::new(fields([("group", "back")])));
        back.write_documents().extend(front.documents());

        assert_eq!(back.find("about").unwrap(), None);
        assert!(back.find_all().unwrap().is_empty());

        back.save("about", &fields([("title", "Back")])).unwrap();
        assert_eq!(
            back.find("about").unwrap(),
            Some(fields([("title", "Back")]))
        );
        assert_eq!(back.documents().len(), 2);

        back.delete("about").unwrap();
        assert_eq!(back.documents().len(), 1);
    }

    #[test]
    fn test_simulated_write_error() {
        let storage = MemStorage::new();
        storage.set_simulate_write_error(true);
        let err = storage.save("x", &fields([("a", "b")])).unwrap_err();
        assert!(matches!(err, ContentError::StorageWrite { .. }));
        assert_eq!(storage.find("x").unwrap(), None);
    }

    #[test]
    fn test_filter_named_field_does_not_move_document() {
        let storage =
            MemStorage::new().with_filter(StorageFilter::new(fields([("site", "a")])));
        storage.save("k", &fields([("title", "T1")])).unwrap();
        storage
            .save("k", &fields([("site", "b"), ("id", "other"), ("title", "T2")]))
            .unwrap();

        assert_eq!(storage.find("k").unwrap(), Some(fields([("title", "T2")])));
        assert_eq!(storage.find("other").unwrap(), None);
        assert_eq!(
            storage.documents(),
            vec![fields([("id", "k"), ("site", "a"), ("title", "T2")])]
        );
    }
}
