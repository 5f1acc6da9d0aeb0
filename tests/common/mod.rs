#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub use bundlewatch_test_utils::builders;
pub use bundlewatch_test_utils::fake_runner;
pub use bundlewatch_test_utils::{init_tracing, with_timeout};

/// A throwaway project on disk:
///
/// ```text
/// <root>/bundler/<commands...>
/// <root>/content/
/// ```
pub struct ScratchProject {
    _dir: TempDir,
    pub root: PathBuf,
}

impl ScratchProject {
    pub fn new(commands: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = dir.path().canonicalize().expect("canonicalize tempdir");
        fs::create_dir_all(root.join("bundler")).expect("create tooling dir");
        fs::create_dir_all(root.join("content")).expect("create content dir");
        for cmd in commands {
            fs::write(root.join("bundler").join(cmd), "").expect("write command file");
        }
        Self { _dir: dir, root }
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn command(&self, name: &str) -> PathBuf {
        self.root.join("bundler").join(name)
    }

    /// Write an executable `/bin/sh` script as the tooling command `name`.
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.command(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        let mut perms = fs::metadata(&path).expect("stat script").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("chmod script");
        path
    }
}
