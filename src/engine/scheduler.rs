// src/engine/scheduler.rs

//! Keyed single-flight scheduler with coalesced reruns.
//!
//! Locking:
//! - `states` (the command → state map) is held only to look up or insert an
//!   entry; entries are never removed.
//! - each `RunState` has its own mutex, so commands never contend with each
//!   other.
//! - no lock is held while the runner starts a process.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::run_state::{CompletionDecision, RunPhase, RunState, TriggerDecision};
use crate::engine::{lock_or_recover, CommandIdentity};
use crate::exec::{Completion, ProcessRunner};

type SharedState = Arc<Mutex<RunState>>;

struct Inner {
    states: Mutex<HashMap<CommandIdentity, SharedState>>,
    runner: Arc<dyn ProcessRunner>,
    /// Number of commands that currently have a run in flight.
    running: watch::Sender<usize>,
}

/// Decides, per command, whether a trigger launches a run, queues a rerun,
/// or is absorbed by an already-pending rerun.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CommandScheduler {
    inner: Arc<Inner>,
}

impl fmt::Debug for CommandScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandScheduler")
            .field("known_commands", &self.known_commands().len())
            .field("running", &self.running_count())
            .finish_non_exhaustive()
    }
}

impl CommandScheduler {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        let (running, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                states: Mutex::new(HashMap::new()),
                runner,
                running,
            }),
        }
    }

    /// Inbound entry point for the file watcher: a changed asset resolved to
    /// this command path.
    pub fn notify_asset_changed(&self, resolved_command: impl Into<PathBuf>) -> TriggerDecision {
        self.trigger(CommandIdentity::new(resolved_command))
    }

    /// Request a run of `command`.
    ///
    /// Starts it if idle; otherwise makes sure exactly one rerun follows the
    /// active run.
    pub fn trigger(&self, command: CommandIdentity) -> TriggerDecision {
        let state = self.state_for(&command);
        let decision = {
            let mut guard = lock_or_recover(&state, "run state");
            let decision = guard.on_trigger();
            if matches!(decision, TriggerDecision::Launch { .. }) {
                self.inner.running.send_modify(|n| *n += 1);
            }
            decision
        };

        match decision {
            TriggerDecision::Launch { run_id } => {
                info!(command = %command, run_id, "starting command");
                self.launch(&command, &state, run_id);
            }
            TriggerDecision::RerunQueued => {
                info!(command = %command, "command already running; rerun queued");
            }
            TriggerDecision::AlreadyQueued => {
                debug!(command = %command, "rerun already queued; trigger coalesced");
            }
        }

        decision
    }

    /// Record that run `run_id` of `command` has finished, launching the
    /// pending rerun if there is one.
    ///
    /// Normally reached through the [`Completion`] handed to the runner.
    pub fn on_process_completed(
        &self,
        command: &CommandIdentity,
        run_id: u64,
    ) -> CompletionDecision {
        let Some(state) = self.existing_state(command) else {
            warn!(command = %command, run_id, "completion for unknown command ignored");
            return CompletionDecision::Stale;
        };

        let decision = {
            let mut guard = lock_or_recover(&state, "run state");
            let decision = guard.on_completed(run_id);
            if decision == CompletionDecision::Idle {
                self.inner
                    .running
                    .send_modify(|n| *n = n.saturating_sub(1));
            }
            decision
        };

        match decision {
            CompletionDecision::Idle => {
                info!(command = %command, run_id, "command finished");
            }
            CompletionDecision::Rerun { run_id: next } => {
                info!(
                    command = %command,
                    finished_run = run_id,
                    run_id = next,
                    "command finished; starting queued rerun"
                );
                self.launch(command, &state, next);
            }
            CompletionDecision::Stale => {
                warn!(command = %command, run_id, "completion for inactive run ignored");
            }
        }

        decision
    }

    /// Phase of `command`, or `None` if it was never triggered.
    pub fn phase_of(&self, command: &CommandIdentity) -> Option<RunPhase> {
        self.existing_state(command)
            .map(|state| lock_or_recover(&state, "run state").phase())
    }

    /// Number of runs started for `command` so far.
    pub fn runs_started(&self, command: &CommandIdentity) -> u64 {
        self.existing_state(command)
            .map(|state| lock_or_recover(&state, "run state").current_run_id())
            .unwrap_or(0)
    }

    /// Every command that has been triggered at least once, sorted.
    pub fn known_commands(&self) -> Vec<CommandIdentity> {
        let mut commands: Vec<CommandIdentity> = lock_or_recover(&self.inner.states, "state map")
            .keys()
            .cloned()
            .collect();
        commands.sort();
        commands
    }

    /// Number of commands with a run in flight.
    pub fn running_count(&self) -> usize {
        *self.inner.running.borrow()
    }

    /// Resolve once no command has a run in flight (immediately if none has).
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.running.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    fn state_for(&self, command: &CommandIdentity) -> SharedState {
        let mut states = lock_or_recover(&self.inner.states, "state map");
        Arc::clone(states.entry(command.clone()).or_default())
    }

    fn existing_state(&self, command: &CommandIdentity) -> Option<SharedState> {
        lock_or_recover(&self.inner.states, "state map")
            .get(command)
            .map(Arc::clone)
    }

    fn launch(&self, command: &CommandIdentity, state: &SharedState, run_id: u64) {
        let scheduler = Arc::downgrade(&self.inner);
        let completion = Completion::new(command.clone(), run_id, move |command, run_id| {
            complete_run(&scheduler, command, run_id);
        });

        let handle = self.inner.runner.start(command, completion);

        if !lock_or_recover(state, "run state").attach_handle(run_id, handle) {
            debug!(command = %command, run_id, "run finished before its handle was stored");
        }
    }
}

fn complete_run(scheduler: &Weak<Inner>, command: &CommandIdentity, run_id: u64) {
    match scheduler.upgrade() {
        Some(inner) => {
            CommandScheduler { inner }.on_process_completed(command, run_id);
        }
        None => debug!(command = %command, run_id, "scheduler dropped before run completed"),
    }
}
