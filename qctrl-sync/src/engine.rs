//! Reconciliation engine.
//!
//! Brings the order store to reflect one decoded batch with minimal writes:
//! insert rows for unseen keys, overwrite rows whose attributes changed, and
//! skip unchanged rows entirely so their modification marker is preserved.

use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use qctrl_core::{IncomingOrder, OrderKey};
use qctrl_store::OrderStore;

use crate::batch;
use crate::error::{RecordError, SyncError};

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    pub created: u64,
    pub updated: u64,
    /// Records that could not be reconciled; they contribute to no counter.
    pub errors: Vec<RecordError>,
    pub duration_ms: u128,
}

/// One end-to-end pass: read the export at `path`, then reconcile.
///
/// This is the canonical entrypoint for the daemon's guard loop and for
/// `qctrl import`.
pub async fn run_pass(store: &OrderStore, path: &Path) -> Result<ReconcileSummary, SyncError> {
    let raw = batch::read_batch(path).await?;
    let summary = reconcile(store, raw).await?;
    info!(
        path = %path.display(),
        created = summary.created,
        updated = summary.updated,
        record_errors = summary.errors.len(),
        duration_ms = summary.duration_ms as u64,
        "reconciliation pass completed",
    );
    Ok(summary)
}

/// Reconcile a decoded batch against the store, in input order.
///
/// Per-record failures are recorded and skipped; only the inability to use
/// the store at all fails the pass.
pub async fn reconcile(
    store: &OrderStore,
    raw: Vec<Value>,
) -> Result<ReconcileSummary, SyncError> {
    let started = Instant::now();

    // Fail the whole pass up front when the store is unreachable, instead of
    // producing one RecordError per batch element.
    store.ping().await?;

    let mut created = 0u64;
    let mut updated = 0u64;
    let mut errors = Vec::new();

    for (index, value) in merge_last_wins(raw) {
        let key = extract_key(&value);
        match reconcile_record(store, value).await {
            Ok(Outcome::Created) => created += 1,
            Ok(Outcome::Updated) => updated += 1,
            Ok(Outcome::Unchanged) => {}
            Err(reason) => {
                let error = RecordError { index, key, reason };
                warn!(%error, "record skipped");
                errors.push(error);
            }
        }
    }

    Ok(ReconcileSummary {
        created,
        updated,
        errors,
        duration_ms: started.elapsed().as_millis(),
    })
}

/// Collapse duplicate keys within one batch, last entry in input order wins.
///
/// A batch that repeats a key is a single logical order line; merging first
/// means the one insert (or update) already carries the final value. Elements
/// whose key cannot be extracted are kept as-is so they surface as record
/// errors at their original index.
fn merge_last_wins(raw: Vec<Value>) -> Vec<(usize, Value)> {
    let mut entries: Vec<(usize, Value)> = Vec::with_capacity(raw.len());
    let mut seen: std::collections::HashMap<OrderKey, usize> = std::collections::HashMap::new();

    for (index, value) in raw.into_iter().enumerate() {
        match extract_key(&value) {
            Some(key) => match seen.get(&key) {
                Some(&slot) => entries[slot].1 = value,
                None => {
                    seen.insert(key, entries.len());
                    entries.push((index, value));
                }
            },
            None => entries.push((index, value)),
        }
    }

    entries
}

enum Outcome {
    Created,
    Updated,
    Unchanged,
}

async fn reconcile_record(store: &OrderStore, value: Value) -> Result<Outcome, String> {
    let incoming: IncomingOrder =
        serde_json::from_value(value).map_err(|err| format!("invalid record: {err}"))?;
    let key = incoming.key();

    let existing = store
        .find_by_key(key)
        .await
        .map_err(|err| format!("lookup failed: {err}"))?;

    match existing {
        None => {
            // A racing insert on the same key is absorbed inside the store;
            // either way the row now matches the record, so it counts as
            // created for this pass.
            store
                .insert(&incoming, Utc::now())
                .await
                .map_err(|err| format!("insert failed: {err}"))?;
            debug!(%key, "order created");
            Ok(Outcome::Created)
        }
        Some(persisted) if persisted.attributes == incoming.attributes => {
            debug!(%key, "order unchanged; write skipped");
            Ok(Outcome::Unchanged)
        }
        Some(persisted) => {
            store
                .update_attributes(persisted.id, &incoming.attributes, Utc::now())
                .await
                .map_err(|err| format!("update failed: {err}"))?;
            debug!(%key, "order updated");
            Ok(Outcome::Updated)
        }
    }
}

/// Best-effort key extraction from a raw element, for error reporting.
fn extract_key(value: &Value) -> Option<OrderKey> {
    let sipno = value.get("sipno")?.as_i64()?;
    let sipsr = value.get("sipsr")?.as_i64()?;
    Some(OrderKey::new(sipno, sipsr))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn key_extraction_handles_malformed_elements() {
        assert_eq!(
            extract_key(&json!({"sipno": 100, "sipsr": 1})),
            Some(OrderKey::new(100, 1))
        );
        assert_eq!(extract_key(&json!({"sipno": "x", "sipsr": 1})), None);
        assert_eq!(extract_key(&json!({"sipno": 100})), None);
        assert_eq!(extract_key(&json!("not an object")), None);
    }

    #[test]
    fn merge_keeps_last_value_for_repeated_key() {
        let raw = vec![
            json!({"sipno": 100, "sipsr": 1, "mik": 5}),
            json!({"sipno": 200, "sipsr": 1, "mik": 3}),
            json!({"sipno": 100, "sipsr": 1, "mik": 7}),
        ];
        let merged = merge_last_wins(raw);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].1["mik"], 7, "later entry replaces earlier");
        assert_eq!(merged[1].1["sipno"], 200);
    }

    #[test]
    fn merge_preserves_unkeyed_elements_and_their_index() {
        let raw = vec![
            json!({"sipno": 1, "sipsr": 1}),
            json!({"sipno": "bad", "sipsr": 1}),
            json!({"sipno": 1, "sipsr": 1}),
        ];
        let merged = merge_last_wins(raw);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].0, 1, "malformed element keeps its batch index");
    }
}
