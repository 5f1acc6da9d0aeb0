use std::collections::HashMap;
use std::sync::Mutex;

use bundlewatch::engine::CommandIdentity;
use bundlewatch::exec::{Completion, ProcessHandle, ProcessRunner};

/// A fake runner that:
/// - records which commands were started, in order
/// - keeps every run "alive" until the test completes it
/// - tracks how many runs of each command were alive at the same time.
#[derive(Default)]
pub struct FakeProcessRunner {
    started: Mutex<Vec<CommandIdentity>>,
    pending: Mutex<Vec<Completion>>,
    alive: Mutex<HashMap<CommandIdentity, (usize, usize)>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start so far, in order.
    pub fn started(&self) -> Vec<CommandIdentity> {
        self.started.lock().unwrap().clone()
    }

    pub fn starts_of(&self, command: &CommandIdentity) -> usize {
        self.started
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == command)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Highest number of simultaneously alive runs seen for `command`.
    pub fn max_alive(&self, command: &CommandIdentity) -> usize {
        self.alive
            .lock()
            .unwrap()
            .get(command)
            .map(|(_, max)| *max)
            .unwrap_or(0)
    }

    /// Finish the oldest alive run. Returns `false` if none was alive.
    pub fn complete_next(&self) -> bool {
        let next = {
            let mut pending = self.pending.lock().unwrap();
            if pending.is_empty() {
                None
            } else {
                Some(pending.remove(0))
            }
        };
        match next {
            Some(completion) => {
                self.finish(completion);
                true
            }
            None => false,
        }
    }

    /// Finish the oldest alive run of `command`, if any.
    pub fn complete_command(&self, command: &CommandIdentity) -> bool {
        let next = {
            let mut pending = self.pending.lock().unwrap();
            pending
                .iter()
                .position(|c| c.command() == command)
                .map(|idx| pending.remove(idx))
        };
        match next {
            Some(completion) => {
                self.finish(completion);
                true
            }
            None => false,
        }
    }

    /// Keep finishing runs (including reruns they cause) until none is
    /// alive. Returns how many runs were finished.
    pub fn complete_all(&self) -> usize {
        let mut finished = 0;
        while self.complete_next() {
            finished += 1;
        }
        finished
    }

    fn finish(&self, completion: Completion) {
        if let Some((alive, _)) = self.alive.lock().unwrap().get_mut(completion.command()) {
            *alive -= 1;
        }
        // The scheduler may start a rerun from inside this call, so no lock
        // may be held here.
        completion.complete();
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn start(&self, command: &CommandIdentity, completion: Completion) -> ProcessHandle {
        self.started.lock().unwrap().push(command.clone());
        {
            let mut alive = self.alive.lock().unwrap();
            let entry = alive.entry(command.clone()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 = entry.1.max(entry.0);
        }
        self.pending.lock().unwrap().push(completion);
        ProcessHandle::untracked()
    }
}
