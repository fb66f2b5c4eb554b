// src/watch/watcher.rs

use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::watch::event_handler::process_event;
use crate::watch::patterns::WatchSource;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher over every directory of `source` and forward
/// relevant changes as `RuntimeEvent::ChangeDetected`.
///
/// Must be called from within a Tokio runtime. Raw events are classified
/// sequentially on a single task, in arrival order.
pub fn spawn_watcher(
    source: Arc<WatchSource>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // The callback runs on notify's thread, outside any span.
                    eprintln!("packwatch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("packwatch: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    for dir in source.watch_dirs() {
        watcher.watch(dir, RecursiveMode::Recursive)?;
        info!("file watcher started on {:?}", dir);
    }

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            if !process_event(&source, event, &runtime_tx).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
