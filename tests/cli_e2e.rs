#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
renderer = "placeholder"
meta_data_fields = ["comment"]

[render_data]
app = "Demo"

[source]
kind = "json"
path = "content"

[overrides]
kind = "toml"
path = "overrides"
"#;

fn setup() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("contentkit.toml"), CONFIG).unwrap();
    let content = temp.path().join("content");
    fs::create_dir_all(content.join("mail")).unwrap();
    fs::write(
        content.join("about.json"),
        r#"{"title": "About", "body": "Welcome to {app}", "comment": "app is the site name"}"#,
    )
    .unwrap();
    fs::write(
        content.join("mail").join("welcome.json"),
        r#"{"title": "Hi {name}", "body": "Thanks for joining"}"#,
    )
    .unwrap();
    temp
}

fn contentkit(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("contentkit"));
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("CONTENTKIT_LOG")
        .env_remove("CONTENTKIT_RENDERER");
    cmd
}

#[test]
fn test_get_shows_fields_without_meta_data() {
    let temp = setup();
    contentkit(temp.path())
        .args(["get", "about"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to {app}"))
        .stdout(predicate::str::contains("app is the site name").not());
}

#[test]
fn test_set_get_reset_workflow() {
    let temp = setup();

    contentkit(temp.path())
        .args(["set", "about", "title", "About us"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved override for about"));
    assert!(temp.path().join("overrides").join("about.toml").exists());

    contentkit(temp.path())
        .args(["get", "about", "--field", "title"])
        .assert()
        .success()
        .stdout("About us\n");

    contentkit(temp.path())
        .args(["reset", "about"])
        .assert()
        .success();

    contentkit(temp.path())
        .args(["get", "about", "-f", "title"])
        .assert()
        .success()
        .stdout("About\n");
}

#[test]
fn test_set_rejects_blank_value() {
    let temp = setup();
    contentkit(temp.path())
        .args(["set", "about", "title", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title cannot be blank."));
    assert!(!temp.path().join("overrides").join("about.toml").exists());

    contentkit(temp.path())
        .args(["set", "about", "title", "", "--no-validate"])
        .assert()
        .success();
}

#[test]
fn test_render_with_vars_and_defaults() {
    let temp = setup();
    contentkit(temp.path())
        .args(["render", "about", "body"])
        .assert()
        .success()
        .stdout("Welcome to Demo\n");

    contentkit(temp.path())
        .args(["render", "mail/welcome", "title", "--var", "name=Ann"])
        .assert()
        .success()
        .stdout("Hi Ann\n");

    contentkit(temp.path())
        .args(["render", "mail/welcome", "title", "--data", r#"{"name": "Bob"}"#])
        .assert()
        .success()
        .stdout("Hi Bob\n");
}

#[test]
fn test_list_and_meta() {
    let temp = setup();
    contentkit(temp.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("about"))
        .stdout(predicate::str::contains("mail/welcome"));

    contentkit(temp.path())
        .args(["meta", "about"])
        .assert()
        .success()
        .stdout(predicate::str::contains("app is the site name"));
}

#[test]
fn test_missing_item_fails() {
    let temp = setup();
    contentkit(temp.path())
        .args(["get", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_explicit_config_path() {
    let temp = setup();
    let elsewhere = TempDir::new().unwrap();
    let config = temp.path().join("contentkit.toml");
    contentkit(elsewhere.path())
        .args(["--config", config.to_str().unwrap(), "get", "about", "-f", "title"])
        .assert()
        .success()
        .stdout("About\n");
}
