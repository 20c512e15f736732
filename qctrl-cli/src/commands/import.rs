//! `qctrl import` — one-shot reconciliation of an export file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use qctrl_daemon::{import_blocking, paths, Config};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// ERP export file to reconcile (same shape as the watched q-ctrl.json).
    pub file: PathBuf,

    /// Data directory override (else QCTRL_DATA_DIR, else ~/.qctrl).
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        let db_path = match self.data_dir {
            Some(data_dir) => paths::db_path(&data_dir),
            None => Config::from_env()
                .context("failed to load configuration")?
                .db_path(),
        };

        let summary = import_blocking(&db_path, &self.file)
            .with_context(|| format!("import of {} failed", self.file.display()))?;

        println!(
            "✓ '{}' reconciled ({} created, {} updated) in {}ms",
            self.file.display(),
            summary.created,
            summary.updated,
            summary.duration_ms,
        );
        if !summary.errors.is_empty() {
            println!(
                "{} {} record(s) were skipped:",
                "!".yellow().bold(),
                summary.errors.len()
            );
            for error in &summary.errors {
                println!("  {error}");
            }
        }
        Ok(())
    }
}
