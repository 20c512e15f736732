//! `qctrl sync` — trigger a reconciliation pass on a running daemon.

use anyhow::Result;
use clap::Args;
use serde_json::{json, Value};

use super::ApiClient;

#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub client: ApiClient,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let response = self.client.post("/api/sync", json!({}))?;
        let admitted = response
            .get("admitted")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if admitted {
            println!("✓ sync pass admitted");
        } else {
            println!("✓ sync already pending; request coalesced");
        }
        Ok(())
    }
}
