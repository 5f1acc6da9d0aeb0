// src/watch/resolver.rs

//! Mapping a changed file to the build command that should run for it.
//!
//! A file is classified by name suffix into an [`AssetKind`]. The nearest
//! directory (from the file upwards to the project root) that contains the
//! tooling directory (default `bundler/`) owns the file; the command is the
//! kind-specific one from that tooling directory if present, otherwise the
//! default command. Files inside the tooling directory never resolve, so a
//! build writing into it cannot retrigger itself.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};

use crate::config::{AssetConfig, ConfigFile};
use crate::engine::CommandIdentity;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::AssetKind;
use crate::watch::path_utils::{normalize, relative_str};

pub struct CommandResolver {
    root: PathBuf,
    tooling_dir: String,
    default_command: String,
    rules: Vec<(AssetKind, AssetConfig)>,
    exclude: Option<GlobSet>,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for CommandResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandResolver")
            .field("root", &self.root)
            .field("tooling_dir", &self.tooling_dir)
            .field("default_command", &self.default_command)
            .finish_non_exhaustive()
    }
}

impl CommandResolver {
    pub fn new(cfg: &ConfigFile, root: impl AsRef<Path>, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let root = normalize(fs.as_ref(), root.as_ref());
        let exclude = build_globset(&cfg.default_section().exclude)?;

        Ok(Self {
            root,
            tooling_dir: cfg.config().tooling_dir.clone(),
            default_command: cfg.config().default_command.clone(),
            rules: cfg.assets().map(|(kind, a)| (kind, a.clone())).collect(),
            exclude,
            fs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Asset kind of a file name, first matching rule wins.
    pub fn classify(&self, file_name: &str) -> Option<AssetKind> {
        self.rules
            .iter()
            .find(|(_, rule)| rule.matches(file_name))
            .map(|(kind, _)| *kind)
    }

    /// Resolve a changed file to the command that should run for it.
    pub fn resolve(&self, changed: &Path) -> Option<CommandIdentity> {
        let changed = normalize(self.fs.as_ref(), changed);

        if !changed.starts_with(&self.root) {
            debug!(
                path = ?changed,
                root = ?self.root,
                "file is outside the project root; ignoring"
            );
            return None;
        }

        if !self.fs.is_file(&changed) {
            trace!(path = ?changed, "not an existing file; ignoring");
            return None;
        }

        let file_name = changed.file_name()?.to_str()?;
        let Some(kind) = self.classify(file_name) else {
            trace!(path = ?changed, "no asset kind for file");
            return None;
        };

        if self.is_excluded(&changed) {
            debug!(path = ?changed, "file matches an exclude pattern; ignoring");
            return None;
        }

        let Some(tooling) = self.tooling_dir_for(&changed) else {
            debug!(
                path = ?changed,
                tooling_dir = %self.tooling_dir,
                "no tooling directory above file"
            );
            return None;
        };

        if changed.starts_with(&tooling) {
            debug!(path = ?changed, "file is inside the tooling directory; ignoring");
            return None;
        }

        let command = self.command_in(&tooling, kind);
        match &command {
            Some(cmd) => debug!(path = ?changed, %kind, command = %cmd, "resolved build command"),
            None => debug!(path = ?changed, %kind, tooling = ?tooling, "no build command present"),
        }
        command
    }

    /// Every configured command present in the project root's tooling
    /// directory, kind-specific ones first, without duplicates.
    pub fn available_commands(&self) -> Vec<CommandIdentity> {
        let tooling = self.root.join(&self.tooling_dir);

        let names = self
            .rules
            .iter()
            .filter_map(|(_, rule)| rule.command.as_deref())
            .chain(std::iter::once(self.default_command.as_str()));

        let mut commands: Vec<CommandIdentity> = Vec::new();
        for name in names {
            let path = tooling.join(name);
            let identity = CommandIdentity::new(path.clone());
            if self.fs.is_file(&path) && !commands.contains(&identity) {
                commands.push(identity);
            }
        }
        commands
    }

    /// Entries of the project root's tooling directory, sorted. Empty if it
    /// cannot be read.
    pub fn tooling_entries(&self) -> Vec<PathBuf> {
        let tooling = self.root.join(&self.tooling_dir);
        match self.fs.read_dir(&tooling) {
            Ok(mut entries) => {
                entries.sort();
                entries
            }
            Err(err) => {
                debug!(path = ?tooling, error = %err, "cannot list tooling directory");
                Vec::new()
            }
        }
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(exclude) = &self.exclude else {
            return false;
        };
        relative_str(self.fs.as_ref(), &self.root, path)
            .is_some_and(|rel| exclude.is_match(rel.as_str()))
    }

    /// Nearest `<dir>/<tooling_dir>` walking up from `changed` to the root.
    /// `changed` must lie under the root.
    fn tooling_dir_for(&self, changed: &Path) -> Option<PathBuf> {
        for dir in changed.ancestors().skip(1) {
            let candidate = dir.join(&self.tooling_dir);
            if self.fs.is_dir(&candidate) {
                return Some(candidate);
            }
            if dir == self.root {
                break;
            }
        }
        None
    }

    fn command_in(&self, tooling: &Path, kind: AssetKind) -> Option<CommandIdentity> {
        let specific = self
            .rules
            .iter()
            .find(|(k, _)| *k == kind)
            .and_then(|(_, rule)| rule.command.as_deref());

        specific
            .into_iter()
            .chain(std::iter::once(self.default_command.as_str()))
            .map(|name| tooling.join(name))
            .find(|path| self.fs.is_file(path))
            .map(CommandIdentity::new)
    }
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    let set = builder
        .build()
        .context("building exclude globset")?;
    Ok(Some(set))
}
