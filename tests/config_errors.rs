// tests/config_errors.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use bundlewatch::config::{load_and_validate, load_or_default};
use bundlewatch::errors::BundlewatchError;
use bundlewatch::types::AssetKind;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn sample_config_loads() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = load_and_validate(manifest_dir.join("demos/Bundlewatch.toml")).unwrap();

    assert_eq!(cfg.config().tooling_dir, "bundler");
    assert_eq!(cfg.default_section().exclude.len(), 2);
    assert_eq!(
        cfg.asset(AssetKind::Js).and_then(|a| a.command.as_deref()),
        Some("bundler-js.cmd")
    );
    // Kinds not mentioned keep their built-in rule.
    assert!(cfg.asset(AssetKind::Css).unwrap().matches("site.css.bundle"));
}

#[test]
fn unknown_asset_kind_is_a_config_error() {
    let file = config_file(
        r#"
[asset.scss]
suffixes = [".scss"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundlewatchError::ConfigError(msg)) => assert!(msg.contains("scss")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn command_outside_tooling_dir_is_rejected() {
    let file = config_file(
        r#"
[config]
default_command = "../../evil.sh"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundlewatchError::ConfigError(msg)) => assert!(msg.contains("default_command")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn empty_suffix_list_is_rejected() {
    let file = config_file(
        r#"
[asset.less]
suffixes = []
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(BundlewatchError::ConfigError(_))
    ));
}

#[test]
fn invalid_exclude_glob_is_rejected() {
    let file = config_file(
        r#"
[default]
exclude = ["a[b"]
"#,
    );

    assert!(load_and_validate(file.path()).is_err());
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = config_file("[config\ntooling_dir = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(BundlewatchError::TomlError(_))
    ));
}

#[test]
fn missing_default_file_means_defaults_but_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    let cfg = load_or_default(None, dir.path()).unwrap();
    assert_eq!(cfg.config().default_command, "bundler.cmd");

    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_or_default(Some(&missing), dir.path()),
        Err(BundlewatchError::IoError(_))
    ));
}

#[test]
fn config_in_project_root_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Bundlewatch.toml"),
        "[config]\ntooling_dir = \"tools\"\n",
    )
    .unwrap();

    let cfg = load_or_default(None, dir.path()).unwrap();
    assert_eq!(cfg.config().tooling_dir, "tools");
}
