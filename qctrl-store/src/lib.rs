//! # qctrl-store
//!
//! Persisted Order Store: SQLite-backed repository keyed on the natural
//! `(sipno, sipsr)` pair. The table enforces key uniqueness; inserts absorb
//! duplicate-key races as no-ops so two overlapping reconciliation passes can
//! never surface a uniqueness violation to a caller.

pub mod error;
mod init;
mod orders;

pub use error::StoreError;
pub use init::{connect, connect_in_memory};
pub use orders::OrderStore;
