// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Config file name looked up in the project root when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "Bundlewatch.toml";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the configuration the CLI should use.
///
/// - An explicit path must exist and be valid.
/// - Without one, `Bundlewatch.toml` in `root` is used if present; otherwise
///   the built-in defaults apply.
pub fn load_or_default(explicit: Option<&Path>, root: &Path) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        info!(path = ?path, "loading config");
        return load_and_validate(path);
    }

    let candidate = default_config_path(root);
    if candidate.is_file() {
        info!(path = ?candidate, "loading config");
        load_and_validate(&candidate)
    } else {
        debug!(path = ?candidate, "no config file found; using built-in defaults");
        Ok(ConfigFile::default())
    }
}

/// Default config location for a project root.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
