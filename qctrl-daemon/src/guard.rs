//! Execution guard: serializes reconciliation passes and coalesces bursts.
//!
//! The guard is a capacity-1 trigger channel drained by a single consumer
//! task, which gives the two-state machine for free: the consumer is either
//! idle (waiting on the channel) or running one pass. A signal that arrives
//! while a pass runs parks in the one buffer slot and guarantees exactly one
//! follow-up pass, so the final file content is always observed; any further
//! signals during that window are absorbed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info};

use qctrl_store::OrderStore;

use crate::error::DaemonError;
use crate::runtime::unix_seconds_now;
use crate::status::{PassOutcome, RuntimeStatus};

/// Where a trigger signal originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    /// Synthetic cold-start signal emitted once at process startup.
    Startup,
    /// Filesystem event on the watched export file.
    Watcher,
    /// Manual trigger over the HTTP API.
    Api,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerSource::Startup => write!(f, "startup"),
            TriggerSource::Watcher => write!(f, "watcher"),
            TriggerSource::Api => write!(f, "api"),
        }
    }
}

/// What happened to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The signal was accepted and will start (or follow) a pass.
    Admitted,
    /// A re-run was already pending; the signal was absorbed.
    Coalesced,
}

/// Sending half of the guard's trigger channel.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    tx: mpsc::Sender<TriggerSource>,
}

pub type TriggerReceiver = mpsc::Receiver<TriggerSource>;

/// Build the trigger channel. Capacity 1 is the single pending-re-run slot.
pub fn sync_trigger() -> (SyncTrigger, TriggerReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SyncTrigger { tx }, rx)
}

impl SyncTrigger {
    /// Signal that the export may have changed. Never blocks.
    pub fn signal(&self, source: TriggerSource) -> Signal {
        match self.tx.try_send(source) {
            Ok(()) => Signal::Admitted,
            Err(TrySendError::Full(_)) => Signal::Coalesced,
            // Shutdown in progress; nothing left to trigger.
            Err(TrySendError::Closed(_)) => Signal::Coalesced,
        }
    }
}

/// Consumer side of the guard: one reconciliation pass per admitted trigger.
///
/// Each pass waits `settle` before reading so a concurrent writer can finish,
/// then runs parse + reconcile and publishes the outcome. Pass failures are
/// absorbed into the status; the task only exits on shutdown.
pub async fn guard_task(
    store: OrderStore,
    watch_path: PathBuf,
    mut triggers: TriggerReceiver,
    status: Arc<RwLock<RuntimeStatus>>,
    settle: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        let source = tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe = triggers.recv() => {
                let Some(source) = maybe else { break };
                source
            }
        };

        debug!(%source, "reconciliation pass admitted");
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = tokio::time::sleep(settle) => {}
        }

        let outcome = match qctrl_sync::run_pass(&store, &watch_path).await {
            Ok(summary) => {
                info!(
                    %source,
                    created = summary.created,
                    updated = summary.updated,
                    record_errors = summary.errors.len(),
                    "pass finished",
                );
                PassOutcome {
                    source,
                    finished_at_unix: unix_seconds_now(),
                    created: summary.created,
                    updated: summary.updated,
                    record_errors: summary.errors.len(),
                    error: None,
                    duration_ms: summary.duration_ms as u64,
                }
            }
            Err(err) => {
                // The guard returns to idle; a later trigger retries.
                error!(%source, error = %err, "pass failed");
                PassOutcome {
                    source,
                    finished_at_unix: unix_seconds_now(),
                    created: 0,
                    updated: 0,
                    record_errors: 0,
                    error: Some(err.to_string()),
                    duration_ms: 0,
                }
            }
        };

        status.write().await.record(outcome);
    }

    Ok(())
}
