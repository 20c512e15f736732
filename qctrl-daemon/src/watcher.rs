//! Change source: filesystem watcher for the ERP export file.
//!
//! Watches the export directory (non-recursive) and signals the guard when
//! the one well-known file changes. Events for unrelated files in the same
//! directory are ignored, and rapid event bursts from a single save collapse
//! inside the debounce window before they ever reach the guard.

use std::fs;
use std::path::{Path, PathBuf};

use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{io_err, DaemonError};
use crate::guard::{Signal, SyncTrigger, TriggerSource};
use crate::paths::{DEBOUNCE_WINDOW, WATCH_FILE};

pub async fn watcher_task(
    watch_dir: PathBuf,
    trigger: SyncTrigger,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    if !watch_dir.exists() {
        fs::create_dir_all(&watch_dir).map_err(|e| io_err(&watch_dir, e))?;
    }

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();
    let mut _watcher: RecommendedWatcher = recommended_watcher(move |event| {
        let _ = event_tx.send(event);
    })?;
    _watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
    debug!(path = %watch_dir.display(), "watching export directory");

    let mut last_seen: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "watcher event error");
                        continue;
                    }
                };
                if !is_relevant_event_kind(&event.kind) {
                    continue;
                }

                for path in event.paths {
                    if !is_watched_file(&path) {
                        continue;
                    }
                    if !should_process_event(&mut last_seen, Instant::now(), DEBOUNCE_WINDOW) {
                        continue;
                    }

                    match trigger.signal(TriggerSource::Watcher) {
                        Signal::Admitted => debug!(path = %path.display(), "change signal admitted"),
                        Signal::Coalesced => {
                            debug!(path = %path.display(), "change signal coalesced into pending pass")
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
}

fn is_watched_file(path: &Path) -> bool {
    path.file_name().and_then(|name| name.to_str()) == Some(WATCH_FILE)
}

fn should_process_event(
    last_seen: &mut Option<Instant>,
    now: Instant,
    threshold: std::time::Duration,
) -> bool {
    match *last_seen {
        Some(seen_at) if now.duration_since(seen_at) < threshold => false,
        _ => {
            *last_seen = Some(now);
            true
        }
    }
}
