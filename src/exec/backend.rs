// src/exec/backend.rs

//! Pluggable process runner abstraction.
//!
//! The scheduler talks to a `ProcessRunner` instead of spawning processes
//! itself. Production code uses
//! [`TokioProcessRunner`](super::process_runner::TokioProcessRunner); tests
//! provide runners that record launches and complete them on demand.

use std::fmt;

use tokio::task::JoinHandle;
use tracing::warn;

use crate::engine::CommandIdentity;

type CompletionFn = Box<dyn FnOnce(&CommandIdentity, u64) + Send + 'static>;

/// Starts one instance of a build command.
pub trait ProcessRunner: Send + Sync {
    /// Launch `command` and return immediately.
    ///
    /// The runner must fire `completion` exactly once, after the process has
    /// exited and its output has been forwarded, or straight away if the
    /// process could not be started.
    fn start(&self, command: &CommandIdentity, completion: Completion) -> ProcessHandle;
}

/// Completion callback for one run.
///
/// Consumed by [`Completion::complete`]. If it is dropped without being
/// completed (e.g. the task driving the process panicked) it fires from
/// `Drop`, so a run can never be left marked as running.
pub struct Completion {
    command: CommandIdentity,
    run_id: u64,
    on_complete: Option<CompletionFn>,
}

impl Completion {
    pub fn new(
        command: CommandIdentity,
        run_id: u64,
        on_complete: impl FnOnce(&CommandIdentity, u64) + Send + 'static,
    ) -> Self {
        Self {
            command,
            run_id,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    pub fn command(&self) -> &CommandIdentity {
        &self.command
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn complete(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(&self.command, self.run_id);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.on_complete.is_some() {
            warn!(
                command = %self.command,
                run_id = self.run_id,
                "run ended without reporting completion; completing it now"
            );
            self.fire();
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("command", &self.command)
            .field("run_id", &self.run_id)
            .field("pending", &self.on_complete.is_some())
            .finish()
    }
}

/// Handle to a live run, owned by the command's `RunState` while it runs.
///
/// Dropping it does not stop the process; runs are never cancelled.
#[derive(Debug)]
pub struct ProcessHandle {
    task: Option<JoinHandle<()>>,
}

impl ProcessHandle {
    /// Handle for a run driven by a tokio task.
    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }

    /// Handle for a run with nothing to track (fake runners).
    pub fn untracked() -> Self {
        Self { task: None }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}
