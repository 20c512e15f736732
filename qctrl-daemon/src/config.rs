//! Environment-driven daemon configuration.
//!
//! `QCTRL_DATA_DIR` — data directory (default `~/.qctrl`); holds the order
//! database and the `ftp-data/` watch directory.
//! `QCTRL_BIND` — HTTP listen address (default `127.0.0.1:3002`).
//! `QCTRL_API_TOKEN` — bearer token for the protected API routes; unset or
//! empty disables authentication.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::DaemonError;
use crate::paths;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
    pub api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, DaemonError> {
        let data_dir = match std::env::var_os("QCTRL_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = dirs::home_dir().ok_or_else(|| {
                    DaemonError::Config(
                        "could not determine home directory; set QCTRL_DATA_DIR".to_string(),
                    )
                })?;
                paths::default_data_dir(&home)
            }
        };

        let bind = std::env::var("QCTRL_BIND")
            .unwrap_or_else(|_| paths::DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| DaemonError::Config(format!("invalid QCTRL_BIND: {err}")))?;

        let api_token = std::env::var("QCTRL_API_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        Ok(Self {
            data_dir,
            bind,
            api_token,
        })
    }

    pub fn watch_dir(&self) -> PathBuf {
        paths::watch_dir(&self.data_dir)
    }

    pub fn watch_path(&self) -> PathBuf {
        paths::watch_path(&self.data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        paths::db_path(&self.data_dir)
    }
}
