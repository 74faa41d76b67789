//! Every storage backend runs through the same checks.

use contentkit::model::fields;
use contentkit::store::file::{JsonStorage, TomlStorage};
use contentkit::store::memory::MemStorage;
use contentkit::store::sqlite::DbStorage;
use contentkit::store::Storage;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn check_save_and_find(storage: &dyn Storage) {
    assert_eq!(storage.find("about").unwrap(), None);

    let record = fields([("title", "About"), ("body", "About us")]);
    storage.save("about", &record).unwrap();
    assert_eq!(storage.find("about").unwrap(), Some(record));
}

fn check_partial_update_keeps_other_fields(storage: &dyn Storage) {
    storage
        .save("page", &fields([("title", "Old"), ("body", "Body")]))
        .unwrap();
    storage.save("page", &fields([("title", "New")])).unwrap();
    assert_eq!(
        storage.find("page").unwrap(),
        Some(fields([("title", "New"), ("body", "Body")]))
    );
}

fn check_delete(storage: &dyn Storage) {
    storage
        .save("gone", &fields([("title", "T"), ("body", "B")]))
        .unwrap();
    storage.delete("gone").unwrap();
    assert_eq!(storage.find("gone").unwrap(), None);

    // deleting again is a no-op
    storage.delete("gone").unwrap();
    storage.delete("never-existed").unwrap();
}

fn check_nested_keys(storage: &dyn Storage) {
    let record = fields([("title", "Welcome"), ("body", "Hi {name}")]);
    storage.save("mail/welcome", &record).unwrap();
    assert_eq!(storage.find("mail/welcome").unwrap(), Some(record));
    assert_eq!(storage.find("welcome").unwrap(), None);
}

fn check_find_all(storage: &dyn Storage) {
    storage
        .save("a", &fields([("title", "A"), ("body", "a")]))
        .unwrap();
    storage
        .save("group/b", &fields([("title", "B"), ("body", "b")]))
        .unwrap();

    let all = storage.find_all().unwrap();
    let expected: BTreeMap<String, _> = [
        ("a".to_string(), fields([("title", "A"), ("body", "a")])),
        ("group/b".to_string(), fields([("title", "B"), ("body", "b")])),
    ]
    .into_iter()
    .collect();
    assert_eq!(all, expected);
}

fn check_empty_values_are_records(storage: &dyn Storage) {
    let record = fields([("title", ""), ("body", "")]);
    storage.save("blank", &record).unwrap();
    assert_eq!(storage.find("blank").unwrap(), Some(record));
}

fn check_key_field_is_not_content(storage: &dyn Storage) {
    storage
        .save("a", &fields([("title", "T1"), ("body", "B")]))
        .unwrap();
    storage
        .save("a", &fields([("id", "b"), ("title", "T2")]))
        .unwrap();

    assert_eq!(storage.find("b").unwrap(), None);
    let record = storage.find("a").unwrap().unwrap();
    assert_eq!(record.get("title").map(String::as_str), Some("T2"));
    assert_eq!(record.get("body").map(String::as_str), Some("B"));
}

/// Eight writers each add their own field to one record; none may be lost.
fn check_concurrent_saves_merge(storage: &dyn Storage) {
    for round in 0..5 {
        let key = format!("shared-{}", round);
        std::thread::scope(|scope| {
            for i in 0..8 {
                let key = key.as_str();
                scope.spawn(move || {
                    let name = format!("f{}", i);
                    storage.save(key, &fields([(name.as_str(), "v")])).unwrap();
                });
            }
        });

        let record = storage.find(&key).unwrap().unwrap();
        for i in 0..8 {
            assert_eq!(
                record.get(&format!("f{}", i)).map(String::as_str),
                Some("v"),
                "round {} lost field f{}",
                round,
                i
            );
        }
    }
}

/// Runs every check, each against a fresh storage from `make`.
fn conformance<S: Storage>(make: impl Fn() -> S) {
    check_save_and_find(&make());
    check_partial_update_keeps_other_fields(&make());
    check_delete(&make());
    check_nested_keys(&make());
    check_find_all(&make());
    check_empty_values_are_records(&make());
    check_key_field_is_not_content(&make());
}

#[test]
fn test_memory_storage_conformance() {
    conformance(MemStorage::new);
}

#[test]
fn test_json_storage_conformance() {
    let temp = TempDir::new().unwrap();
    let counter = std::cell::Cell::new(0);
    conformance(|| {
        counter.set(counter.get() + 1);
        JsonStorage::new(temp.path().join(format!("json-{}", counter.get())))
    });
}

#[test]
fn test_toml_storage_conformance() {
    let temp = TempDir::new().unwrap();
    let counter = std::cell::Cell::new(0);
    conformance(|| {
        counter.set(counter.get() + 1);
        TomlStorage::new(temp.path().join(format!("toml-{}", counter.get())))
    });
}

#[test]
fn test_db_storage_conformance() {
    conformance(|| {
        let storage = DbStorage::open_in_memory("content").unwrap();
        storage.create_table(&["title", "body"]).unwrap();
        storage
    });
}

#[test]
fn test_db_storage_file_conformance() {
    let temp = TempDir::new().unwrap();
    let counter = std::cell::Cell::new(0);
    conformance(|| {
        counter.set(counter.get() + 1);
        let path = temp.path().join(format!("content-{}.db", counter.get()));
        let storage = DbStorage::open(&path, "content")
            .unwrap()
            .with_columns(["title", "body"]);
        storage.create_table(&[]).unwrap();
        storage
    });
}

#[test]
fn test_memory_storage_concurrent_saves() {
    check_concurrent_saves_merge(&MemStorage::new());
}

#[test]
fn test_json_storage_concurrent_saves() {
    let temp = TempDir::new().unwrap();
    check_concurrent_saves_merge(&JsonStorage::new(temp.path()));
}

#[test]
fn test_toml_storage_concurrent_saves() {
    let temp = TempDir::new().unwrap();
    check_concurrent_saves_merge(&TomlStorage::new(temp.path()));
}

#[test]
fn test_db_storage_concurrent_saves() {
    let temp = TempDir::new().unwrap();
    let storage = DbStorage::open(&temp.path().join("content.db"), "content").unwrap();
    check_concurrent_saves_merge(&storage);
}

#[test]
fn test_db_storage_without_schema_conformance() {
    conformance(|| DbStorage::open_in_memory("content").unwrap());
}

#[test]
fn test_file_storage_leaves_no_tmp_files() {
    let temp = TempDir::new().unwrap();
    let storage = JsonStorage::new(temp.path());
    storage
        .save("mail/welcome", &fields([("title", "T")]))
        .unwrap();
    storage
        .save("mail/welcome", &fields([("title", "T2")]))
        .unwrap();

    let mail_dir = temp.path().join("mail");
    let names: Vec<String> = std::fs::read_dir(&mail_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["welcome.json"]);
}

#[test]
fn test_file_storage_backslash_keys_nest() {
    let temp = TempDir::new().unwrap();
    let storage = TomlStorage::new(temp.path());
    storage
        .save("mail\\welcome", &fields([("title", "T")]))
        .unwrap();
    assert!(temp.path().join("mail").join("welcome.toml").exists());
    assert_eq!(
        storage.find("mail/welcome").unwrap(),
        Some(fields([("title", "T")]))
    );
}
