// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::engine::CommandScheduler;
use crate::errors::Result;
use crate::watch::cache::FileHashCache;
use crate::watch::event_handler::process_event;
use crate::watch::resolver::CommandResolver;

/// Events arriving within this long of the first one are handled as one batch.
const SETTLE: Duration = Duration::from_millis(50);

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Watch the resolver's root recursively and trigger the owning command of
/// every asset whose content changed on save, add or rename.
///
/// Must be called from within a tokio runtime.
pub fn spawn_watcher(
    resolver: Arc<CommandResolver>,
    scheduler: CommandScheduler,
) -> Result<WatcherHandle> {
    let root = resolver.root().to_path_buf();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watcher event loop gone; dropping notify event");
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("file watcher started on {:?}", root);

    let hashes = Arc::new(Mutex::new(FileHashCache::new()));

    tokio::spawn(async move {
        while let Some(batch) = next_batch(&mut event_rx).await {
            debug!(events = batch.len(), "processing notify events");

            let resolver = Arc::clone(&resolver);
            let scheduler = scheduler.clone();
            let hashes = Arc::clone(&hashes);

            // Resolution and hashing touch the disk.
            let res = tokio::task::spawn_blocking(move || {
                let mut hashes = hashes.lock().unwrap_or_else(PoisonError::into_inner);
                batch
                    .iter()
                    .map(|event| process_event(&resolver, &scheduler, &mut hashes, event))
                    .sum::<usize>()
            })
            .await;

            match res {
                Ok(triggered) => debug!(triggered, "notify events processed"),
                Err(err) => warn!(error = %err, "event processing task failed"),
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        root,
    })
}

/// Wait for an event, then collect whatever else arrives within [`SETTLE`].
/// Returns `None` once the channel is closed and drained.
async fn next_batch(rx: &mut UnboundedReceiver<Event>) -> Option<Vec<Event>> {
    let first = rx.recv().await?;
    let mut batch = vec![first];

    let settle = tokio::time::sleep(SETTLE);
    tokio::pin!(settle);

    loop {
        tokio::select! {
            _ = &mut settle => break,
            next = rx.recv() => match next {
                Some(event) => batch.push(event),
                None => break,
            },
        }
    }

    Some(batch)
}
