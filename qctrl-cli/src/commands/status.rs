//! `qctrl status` — daemon pass history and uptime.

use anyhow::{Context, Result};
use clap::Args;

use super::ApiClient;

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub client: ApiClient,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let status = self.client.get("/api/status")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("failed to render status JSON")?
        );
        Ok(())
    }
}
