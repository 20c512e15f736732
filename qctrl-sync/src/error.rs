//! Error taxonomy for reconciliation passes.
//!
//! [`SyncError`] aborts a whole pass before any store write; [`RecordError`]
//! is per-record data carried in the pass summary and never propagated.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use qctrl_core::OrderKey;
use qctrl_store::StoreError;

/// Pass-fatal errors. None of these escape the daemon's guard loop; they are
/// logged and the guard returns to idle so a later trigger can retry.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The export file's bytes are not valid JSON.
    #[error("export file is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// The decoded document lacks the `wtemp` order array. Distinct from a
    /// decode failure so a malformed-but-parseable export is reportable.
    #[error("export file has no top-level 'wtemp' order array")]
    Schema,

    /// An I/O error while reading the export file. A missing file is *not*
    /// an I/O error; it yields an empty batch.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store cannot be reached at all for this pass.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// One record that could not be reconciled. The pass continues past it.
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    /// Position of the record in the decoded batch.
    pub index: usize,
    /// Natural key, when it could be extracted from the raw record.
    pub key: Option<OrderKey>,
    pub reason: String,
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.key {
            Some(key) => write!(f, "record {} (key {}): {}", self.index, key, self.reason),
            None => write!(f, "record {}: {}", self.index, self.reason),
        }
    }
}
