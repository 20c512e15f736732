//! Shared runtime status published by the guard and served by the API.

use serde::Serialize;

use crate::guard::TriggerSource;

/// Snapshot of the daemon's reconciliation history.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub started_at_unix: u64,
    /// Completed passes, including ones that failed to obtain a batch.
    pub passes: u64,
    pub last_pass: Option<PassOutcome>,
}

impl RuntimeStatus {
    pub fn new(started_at_unix: u64) -> Self {
        Self {
            started_at_unix,
            passes: 0,
            last_pass: None,
        }
    }

    pub fn record(&mut self, outcome: PassOutcome) {
        self.passes += 1;
        self.last_pass = Some(outcome);
    }
}

/// What one reconciliation pass did, for observability.
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub source: TriggerSource,
    pub finished_at_unix: u64,
    pub created: u64,
    pub updated: u64,
    pub record_errors: usize,
    /// Pass-fatal error, when the batch could not be obtained at all.
    pub error: Option<String>,
    pub duration_ms: u64,
}
