//! `qctrl serve` — run the daemon in the foreground.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use qctrl_daemon::{start_blocking, Config};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Data directory override (else QCTRL_DATA_DIR, else ~/.qctrl).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// HTTP listen address override (else QCTRL_BIND, else 127.0.0.1:3002).
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

impl ServeArgs {
    pub fn run(self) -> Result<()> {
        let mut config = Config::from_env().context("failed to load daemon configuration")?;
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(bind) = self.bind {
            config.bind = bind;
        }

        start_blocking(config).context("daemon exited with error")
    }
}
