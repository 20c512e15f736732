//! Batch parser for the watched ERP export file.
//!
//! The parser stops at top-level shape validation and hands raw array
//! elements to the engine; typing each element there keeps one malformed
//! record from sinking the rest of the batch.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{io_err, SyncError};

/// Top-level field holding the order array in the ERP export.
pub const ORDER_LIST_FIELD: &str = "wtemp";

/// Read and parse the export file at `path`.
///
/// A file that does not exist at read time (deleted between signal and read)
/// is a normal outcome: the batch is simply empty.
pub async fn read_batch(path: &Path) -> Result<Vec<Value>, SyncError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "export file absent; empty batch");
            return Ok(Vec::new());
        }
        Err(err) => return Err(io_err(path, err)),
    };
    parse_batch(&bytes)
}

/// Decode raw export bytes into the order element sequence.
///
/// Fails with [`SyncError::Decode`] when the bytes are not JSON and with
/// [`SyncError::Schema`] when the document has no `wtemp` array.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<Value>, SyncError> {
    let root: Value = serde_json::from_slice(bytes).map_err(SyncError::Decode)?;

    let Value::Object(mut document) = root else {
        return Err(SyncError::Schema);
    };
    match document.remove(ORDER_LIST_FIELD) {
        Some(Value::Array(orders)) => Ok(orders),
        _ => Err(SyncError::Schema),
    }
}
