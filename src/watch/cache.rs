// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::watch::hash::compute_file_hash;

/// Last seen content hash of every asset that resolved to a command.
///
/// A change event whose file still hashes to the recorded value is not a
/// change. This is what stops a build that rewrites its own outputs with the
/// same bytes from triggering itself again.
#[derive(Debug, Default)]
pub struct FileHashCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileHashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-hash `path` and record the result. Returns `true` if the content
    /// differs from the last recorded hash, or was never recorded.
    ///
    /// A file that cannot be hashed counts as changed.
    pub fn refresh(&mut self, path: &Path) -> bool {
        let hash = match compute_file_hash(path) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(?path, error = %err, "failed to hash file; treating it as changed");
                self.hashes.remove(path);
                return true;
            }
        };

        if self.hashes.get(path) == Some(&hash) {
            debug!(?path, "content unchanged");
            return false;
        }
        self.hashes.insert(path.to_path_buf(), hash);
        true
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
