//! Daemon runtime: export-file watcher + execution guard + HTTP API.

pub mod api;
pub mod config;
mod error;
pub mod guard;
pub mod paths;
mod runtime;
pub mod status;
mod watcher;

pub use config::Config;
pub use error::DaemonError;
pub use guard::{sync_trigger, Signal, SyncTrigger, TriggerReceiver, TriggerSource};
pub use runtime::{import_blocking, run, start_blocking};
pub use status::{PassOutcome, RuntimeStatus};
