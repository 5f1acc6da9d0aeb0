// src/engine/mod.rs

//! Command scheduling engine.
//!
//! - [`run_state`] is the pure per-command state machine
//!   (Idle → Running → Running+RerunPending) with no locks or IO.
//! - [`scheduler`] owns the command → state map, takes the locks, and hands
//!   launches to a [`ProcessRunner`](crate::exec::ProcessRunner).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

pub mod run_state;
pub mod scheduler;

pub use run_state::{CompletionDecision, RunPhase, RunState, TriggerDecision};
pub use scheduler::CommandScheduler;

/// Resolved path of a build command; the scheduling key.
///
/// Two triggers with the same path are the same job, whichever file caused
/// them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandIdentity(PathBuf);

impl CommandIdentity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CommandIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for CommandIdentity {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for CommandIdentity {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

/// Lock a mutex whose contents stay consistent even if a holder panicked.
pub(crate) fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<MutexGuard<'a, T>>| {
        warn!(lock = what, "mutex poisoned; continuing with its current state");
        poisoned.into_inner()
    })
}
