use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::AssetKind;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// tooling_dir = "bundler"
/// default_command = "bundler.cmd"
///
/// [default]
/// exclude = ["**/node_modules/**"]
///
/// [asset.less]
/// suffixes = [".less"]
/// command = "bundler-less.cmd"
/// ```
///
/// All sections are optional. An `[asset.<kind>]` table replaces the
/// built-in entry for that kind only.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// Keyed by asset kind name (`less`, `css`, `js`, `other`).
    #[serde(default)]
    pub asset: BTreeMap<String, AssetConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (see
/// `validate.rs`) or `ConfigFile::default()`, so the rest of the crate can
/// rely on its invariants.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    default: DefaultSection,
    asset: BTreeMap<AssetKind, AssetConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        default: DefaultSection,
        asset: BTreeMap<AssetKind, AssetConfig>,
    ) -> Self {
        Self {
            config,
            default,
            asset,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    /// Asset rules in classification priority order.
    pub fn assets(&self) -> impl Iterator<Item = (AssetKind, &AssetConfig)> {
        self.asset.iter().map(|(kind, cfg)| (*kind, cfg))
    }

    pub fn asset(&self, kind: AssetKind) -> Option<&AssetConfig> {
        self.asset.get(&kind)
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            ConfigSection::default(),
            DefaultSection::default(),
            default_assets(),
        )
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Name of the directory (relative to a project directory) holding the
    /// build commands. Changes inside it never trigger a build.
    #[serde(default = "default_tooling_dir")]
    pub tooling_dir: String,

    /// Command run for any recognised asset whose kind has no specific
    /// command, or whose specific command does not exist.
    #[serde(default = "default_command")]
    pub default_command: String,
}

fn default_tooling_dir() -> String {
    "bundler".to_string()
}

fn default_command() -> String {
    "bundler.cmd".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            tooling_dir: default_tooling_dir(),
            default_command: default_command(),
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultSection {
    /// Glob patterns (relative to the project root, forward slashes) whose
    /// matches never trigger a build.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[asset.<kind>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetConfig {
    /// File-name suffixes classified as this kind (case-sensitive).
    pub suffixes: Vec<String>,

    /// Kind-specific command file name inside the tooling directory.
    #[serde(default)]
    pub command: Option<String>,
}

impl AssetConfig {
    pub fn new(suffixes: &[&str], command: Option<&str>) -> Self {
        Self {
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
            command: command.map(str::to_string),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.suffixes.iter().any(|s| file_name.ends_with(s.as_str()))
    }
}

/// Built-in asset rules.
pub fn default_assets() -> BTreeMap<AssetKind, AssetConfig> {
    BTreeMap::from([
        (
            AssetKind::Less,
            AssetConfig::new(&[".less"], Some("bundler-less.cmd")),
        ),
        (
            AssetKind::Css,
            AssetConfig::new(&[".css", "css.bundle"], Some("bundler-css.cmd")),
        ),
        (
            AssetKind::Js,
            AssetConfig::new(&[".js", ".js.bundle"], Some("bundler-js.cmd")),
        ),
        (AssetKind::Other, AssetConfig::new(&[".sass", ".coffee"], None)),
    ])
}
