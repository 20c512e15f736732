//! # qctrl-sync
//!
//! Batch parser and reconciliation engine for the ERP export file.
//!
//! Call [`run_pass`] for one end-to-end reconciliation: read the export,
//! validate its shape, and bring the order store to reflect it with minimal
//! writes. The engine is best-effort over a batch — one bad record is logged
//! and skipped, never fatal for its neighbors.

pub mod batch;
pub mod engine;
pub mod error;

pub use engine::{reconcile, run_pass, ReconcileSummary};
pub use error::{RecordError, SyncError};
