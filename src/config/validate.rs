// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;

use crate::config::model::{default_assets, ConfigFile, RawConfigFile};
use crate::errors::{BundlewatchError, Result};
use crate::types::AssetKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BundlewatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        // User tables replace the built-in rule for their kind only.
        let mut assets = default_assets();
        for (name, asset) in raw.asset {
            assets.insert(parse_kind(&name)?, asset);
        }

        Ok(ConfigFile::new_unchecked(raw.config, raw.default, assets))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_tooling_dir(&cfg.config.tooling_dir)?;
    validate_command_name("[config].default_command", &cfg.config.default_command)?;
    validate_assets(cfg)?;
    validate_excludes(cfg)?;
    Ok(())
}

fn validate_tooling_dir(dir: &str) -> Result<()> {
    if dir.trim().is_empty() {
        return Err(BundlewatchError::ConfigError(
            "[config].tooling_dir must not be empty".to_string(),
        ));
    }

    let path = Path::new(dir);
    let only_normal = path.components().all(|c| matches!(c, Component::Normal(_)));
    if !only_normal {
        return Err(BundlewatchError::ConfigError(format!(
            "[config].tooling_dir must be a relative directory name (got '{dir}')"
        )));
    }

    Ok(())
}

fn validate_command_name(field: &str, name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let is_bare = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );

    if !is_bare {
        return Err(BundlewatchError::ConfigError(format!(
            "{field} must be a bare file name inside the tooling directory (got '{name}')"
        )));
    }

    Ok(())
}

fn parse_kind(name: &str) -> Result<AssetKind> {
    name.parse::<AssetKind>()
        .map_err(|e| BundlewatchError::ConfigError(format!("[asset.{name}]: {e}")))
}

fn validate_assets(cfg: &RawConfigFile) -> Result<()> {
    for (kind, asset) in cfg.asset.iter() {
        parse_kind(kind)?;
        if asset.suffixes.is_empty() {
            return Err(BundlewatchError::ConfigError(format!(
                "[asset.{kind}] must list at least one suffix"
            )));
        }
        if asset.suffixes.iter().any(|s| s.is_empty()) {
            return Err(BundlewatchError::ConfigError(format!(
                "[asset.{kind}] contains an empty suffix"
            )));
        }
        if let Some(ref command) = asset.command {
            validate_command_name(&format!("[asset.{kind}].command"), command)?;
        }
    }
    Ok(())
}

fn validate_excludes(cfg: &RawConfigFile) -> Result<()> {
    for pattern in cfg.default.exclude.iter() {
        Glob::new(pattern)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_builtin_rules() {
        let raw: RawConfigFile = toml::from_str("").unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();

        assert_eq!(cfg.config().tooling_dir, "bundler");
        assert_eq!(cfg.config().default_command, "bundler.cmd");
        let kinds: Vec<AssetKind> = cfg.assets().map(|(k, _)| k).collect();
        assert_eq!(kinds, AssetKind::ALL.to_vec());
    }

    #[test]
    fn asset_table_overrides_only_its_kind() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[asset.js]
suffixes = [".mjs"]
command = "build-js.sh"
"#,
        )
        .unwrap();
        let cfg = ConfigFile::try_from(raw).unwrap();

        let js = cfg.asset(AssetKind::Js).unwrap();
        assert_eq!(js.suffixes, vec![".mjs".to_string()]);
        assert_eq!(js.command.as_deref(), Some("build-js.sh"));

        let less = cfg.asset(AssetKind::Less).unwrap();
        assert_eq!(less.command.as_deref(), Some("bundler-less.cmd"));
    }

    #[test]
    fn command_with_directory_is_rejected() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[config]
default_command = "../escape.cmd"
"#,
        )
        .unwrap();

        match ConfigFile::try_from(raw) {
            Err(BundlewatchError::ConfigError(msg)) => assert!(msg.contains("default_command")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn unknown_asset_kind_is_rejected() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[asset.scss]
suffixes = [".scss"]
"#,
        )
        .unwrap();

        match ConfigFile::try_from(raw) {
            Err(BundlewatchError::ConfigError(msg)) => assert!(msg.contains("scss")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn absolute_tooling_dir_is_rejected() {
        let raw: RawConfigFile = toml::from_str(
            r#"
[config]
tooling_dir = "/opt/bundler"
"#,
        )
        .unwrap();

        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(BundlewatchError::ConfigError(_))
        ));
    }
}
