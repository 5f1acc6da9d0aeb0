#![allow(dead_code)]

use bundlewatch::config::{AssetConfig, ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_tooling_dir(mut self, dir: &str) -> Self {
        self.config.config.tooling_dir = dir.to_string();
        self
    }

    pub fn with_default_command(mut self, cmd: &str) -> Self {
        self.config.config.default_command = cmd.to_string();
        self
    }

    /// Replace the rule for one asset kind (`less`, `css`, `js`, `other`).
    pub fn with_asset(mut self, kind: &str, suffixes: &[&str], command: Option<&str>) -> Self {
        self.config
            .asset
            .insert(kind.to_string(), AssetConfig::new(suffixes, command));
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
