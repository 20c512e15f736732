use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filename of the ERP export dropped into the watch directory.
pub const WATCH_FILE: &str = "q-ctrl.json";
/// Filename of the order database inside the data directory.
pub const DB_FILE: &str = "qctrl.db";

/// Wait after a change signal before reading, so a writer mid-flight can
/// finish. Best-effort mitigation, not a guarantee.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);
/// Per-path window inside which repeated filesystem events collapse.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub const DEFAULT_BIND: &str = "127.0.0.1:3002";

pub fn default_data_dir(home: &Path) -> PathBuf {
    home.join(".qctrl")
}

pub fn watch_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("ftp-data")
}

pub fn watch_path(data_dir: &Path) -> PathBuf {
    watch_dir(data_dir).join(WATCH_FILE)
}

pub fn db_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE)
}
