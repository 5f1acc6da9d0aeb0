// src/watch/mod.rs

//! File watching and command resolution.
//!
//! This module is responsible for:
//! - Mapping a changed asset to the build command that owns it.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Content hashing, so a file rewritten with identical bytes (typically a
//!   build's own output) does not trigger anything.
//!
//! It does not know how commands are scheduled; it only hands resolved
//! command paths to the [`CommandScheduler`](crate::engine::CommandScheduler).

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod resolver;
pub mod watcher;

pub use cache::FileHashCache;
pub use event_handler::{change_reason, process_event, process_file_change};
pub use resolver::CommandResolver;
pub use watcher::{spawn_watcher, WatcherHandle};
