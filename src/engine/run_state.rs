// src/engine/run_state.rs

//! Per-command run state machine.
//!
//! Three reachable phases:
//!
//! ```text
//!            trigger                 trigger
//!   Idle ─────────────▶ Running ─────────────▶ RerunPending
//!    ▲                    │  ▲                      │
//!    └────── done ────────┘  └──────── done ────────┘
//!                               (rerun launched)
//! ```
//!
//! Every launch gets a fresh `run_id`; completions name the run they belong
//! to, and a completion for any other run is ignored.

use crate::exec::ProcessHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    RerunPending,
}

/// What the caller must do after a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// The command was idle: start run `run_id`.
    Launch { run_id: u64 },
    /// A run is active; one rerun is now pending.
    RerunQueued,
    /// A run is active and a rerun was already pending; nothing changes.
    AlreadyQueued,
}

/// What the caller must do after a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionDecision {
    /// No rerun pending; the command is idle.
    Idle,
    /// The pending rerun was consumed: start run `run_id`.
    Rerun { run_id: u64 },
    /// The completion does not belong to the active run.
    Stale,
}

#[derive(Debug, Default)]
pub struct RunState {
    running: bool,
    queued: bool,
    run_id: u64,
    handle: Option<ProcessHandle>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RunPhase {
        match (self.running, self.queued) {
            (false, _) => RunPhase::Idle,
            (true, false) => RunPhase::Running,
            (true, true) => RunPhase::RerunPending,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Id of the most recently launched run (0 before the first launch).
    pub fn current_run_id(&self) -> u64 {
        self.run_id
    }

    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    pub fn on_trigger(&mut self) -> TriggerDecision {
        if !self.running {
            self.running = true;
            self.run_id += 1;
            return TriggerDecision::Launch {
                run_id: self.run_id,
            };
        }

        if self.queued {
            TriggerDecision::AlreadyQueued
        } else {
            self.queued = true;
            TriggerDecision::RerunQueued
        }
    }

    pub fn on_completed(&mut self, run_id: u64) -> CompletionDecision {
        if !self.running || run_id != self.run_id {
            return CompletionDecision::Stale;
        }

        self.handle = None;

        if self.queued {
            // Stays running: the rerun takes over without passing through
            // Idle, so no other trigger can start a second process.
            self.queued = false;
            self.run_id += 1;
            CompletionDecision::Rerun {
                run_id: self.run_id,
            }
        } else {
            self.running = false;
            CompletionDecision::Idle
        }
    }

    /// Store the handle of run `run_id` if that run is still the active one.
    ///
    /// Returns `false` (and drops the handle) if the run already completed.
    pub fn attach_handle(&mut self, run_id: u64, handle: ProcessHandle) -> bool {
        if self.running && self.run_id == run_id {
            self.handle = Some(handle);
            true
        } else {
            false
        }
    }
}
