//! Configuration tests

use std::fs;

use crate::util::config::{load_config, SimConfig, CONFIG_FILE};

#[test]
fn test_defaults_when_file_absent() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = load_config(dir.path()).expect("defaults");
    assert_eq!(config.scripts.dir, std::path::PathBuf::from("scripts"));
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join(CONFIG_FILE), "[scripts]\ndir = \"models/behavior\"\n")
        .expect("write config");

    let config = load_config(dir.path()).expect("load");
    assert_eq!(config.scripts.dir, std::path::PathBuf::from("models/behavior"));
    assert_eq!(config.log.level, "info");
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join(CONFIG_FILE), "scripts = not toml").expect("write config");
    assert!(load_config(dir.path()).is_err());
}

#[test]
fn test_default_roundtrips_through_toml() {
    let rendered = toml::to_string(&SimConfig::default()).expect("serialize");
    let parsed: SimConfig = toml::from_str(&rendered).expect("parse");
    assert_eq!(parsed.log.level, "info");
}
