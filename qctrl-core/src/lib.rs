//! # qctrl-core
//!
//! Domain types for the qctrl order table: the composite natural key, the
//! descriptive attribute record shared by incoming and persisted orders, and
//! the one normalization rule (stock number to its string form) applied at
//! decode time so that attribute comparison stays plain structural equality.

pub mod types;

pub use types::{IncomingOrder, OrderAttributes, OrderKey, PersistedOrder};
