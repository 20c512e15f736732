//! Error types for the order store.

use std::path::PathBuf;

use qctrl_core::OrderKey;
use thiserror::Error;

/// All errors that can arise from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An error from the underlying SQLite database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An I/O error while preparing the database location.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No persisted order exists for the given natural key.
    #[error("no order with key {key}")]
    NotFound { key: OrderKey },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
