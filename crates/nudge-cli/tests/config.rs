use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn bin(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nudge"));
    cmd.env("NUDGE_HOME", home.path())
        .env_remove("NUDGE_SAVE_FILE")
        .env_remove("NUDGE_BORDER_COLOR")
        .env_remove("NUDGE_TITLE");
    cmd
}

fn get(home: &TempDir, key: &str) -> String {
    let out = bin(home).args(["config", "get", key]).output().expect("get");
    assert!(out.status.success());
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

#[test]
fn set_validates_and_persists() {
    let home = TempDir::new().expect("home");

    let ok = bin(&home)
        .args(["config", "set", "border-color", "33"])
        .output()
        .expect("set");
    assert!(ok.status.success());
    assert_eq!(get(&home, "border-color"), "33");

    let bad = bin(&home)
        .args(["config", "set", "border-color", "256"])
        .output()
        .expect("set");
    assert!(!bad.status.success());
    assert!(String::from_utf8_lossy(&bad.stderr).contains("border-color"));
    assert_eq!(get(&home, "border-color"), "33");
}

#[test]
fn environment_is_overridden_by_saved_value() {
    let home = TempDir::new().expect("home");
    let out = bin(&home)
        .env("NUDGE_TITLE", "FROM ENV")
        .args(["config", "get", "title"])
        .output()
        .expect("get");
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "FROM ENV");

    bin(&home)
        .args(["config", "set", "title", "SAVED"])
        .output()
        .expect("set");
    let out = bin(&home)
        .env("NUDGE_TITLE", "FROM ENV")
        .args(["config", "get", "title"])
        .output()
        .expect("get");
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "SAVED");
}

#[test]
fn preset_export_import_and_reset() {
    let home = TempDir::new().expect("home");
    let preset = bin(&home)
        .args(["config", "preset", "loud"])
        .output()
        .expect("preset");
    assert!(preset.status.success());
    assert_eq!(get(&home, "border-color"), "196");

    let theme = home.path().join("loud.conf");
    let export = bin(&home)
        .args(["config", "export"])
        .arg(&theme)
        .arg("--colors-only")
        .output()
        .expect("export");
    assert!(export.status.success());
    let text = std::fs::read_to_string(&theme).expect("theme");
    assert!(text.contains("border-color=196"));
    assert!(!text.contains("title="));

    let reset = bin(&home)
        .args(["config", "reset", "colors"])
        .output()
        .expect("reset");
    assert!(reset.status.success());
    assert_eq!(get(&home, "border-color"), "240");

    let import = bin(&home)
        .args(["config", "import"])
        .arg(&theme)
        .output()
        .expect("import");
    assert!(import.status.success());
    assert_eq!(get(&home, "border-color"), "196");

    let unknown = bin(&home)
        .args(["config", "preset", "glitter"])
        .output()
        .expect("preset");
    assert!(!unknown.status.success());
}

#[test]
fn list_json_has_every_key() {
    let home = TempDir::new().expect("home");
    let out = bin(&home)
        .args(["config", "list", "--json"])
        .output()
        .expect("list");
    assert!(out.status.success());
    let parsed: Value = serde_json::from_slice(&out.stdout).expect("json");
    let map = parsed.as_object().expect("object");
    for key in ["title", "task-colors", "box-vertical", "show-hints", "padding-left"] {
        assert!(map.contains_key(key), "missing {key}");
    }
    assert_eq!(map.get("heart-position").and_then(|v| v.as_str()), Some("left"));
}
