// src/watch/event_handler.rs

//! Turning raw notify events into command triggers.

use std::path::Path;

use notify::event::{EventKind, ModifyKind};
use notify::Event;
use tracing::{debug, info};

use crate::engine::{CommandScheduler, TriggerDecision};
use crate::types::ChangeReason;
use crate::watch::cache::FileHashCache;
use crate::watch::resolver::CommandResolver;

/// Why a notify event counts as a change, or `None` if it does not.
///
/// Removals and access events never trigger a build.
pub fn change_reason(kind: &EventKind) -> Option<ChangeReason> {
    match kind {
        EventKind::Create(_) => Some(ChangeReason::Added),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeReason::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(_) => Some(ChangeReason::Saved),
        _ => None,
    }
}

/// Handle one changed path: resolve it and, if a command owns it and its
/// content actually changed, trigger it.
pub fn process_file_change(
    resolver: &CommandResolver,
    scheduler: &CommandScheduler,
    hashes: &mut FileHashCache,
    path: &Path,
    reason: ChangeReason,
) -> Option<TriggerDecision> {
    let command = resolver.resolve(path)?;

    if !hashes.refresh(path) {
        debug!(%reason, ?path, command = %command, "content unchanged; not triggering");
        return None;
    }

    info!(%reason, ?path, command = %command, "asset changed");
    Some(scheduler.notify_asset_changed(command.as_path()))
}

/// Handle every path of a notify event. Returns how many triggers it caused.
pub fn process_event(
    resolver: &CommandResolver,
    scheduler: &CommandScheduler,
    hashes: &mut FileHashCache,
    event: &Event,
) -> usize {
    let Some(reason) = change_reason(&event.kind) else {
        debug!(kind = ?event.kind, "ignoring event kind");
        return 0;
    };

    event
        .paths
        .iter()
        .filter_map(|path| process_file_change(resolver, scheduler, hashes, path, reason))
        .count()
}
