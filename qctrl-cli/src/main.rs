//! q-ctrl — ERP order synchronization CLI.
//!
//! # Usage
//!
//! ```text
//! qctrl serve [--data-dir <path>] [--bind <addr>]
//! qctrl import <file> [--data-dir <path>]
//! qctrl sync [--url <base>] [--token <token>]
//! qctrl status [--url <base>] [--token <token>]
//! qctrl orders [--json] [--url <base>] [--token <token>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    import::ImportArgs, orders::OrdersArgs, serve::ServeArgs, status::StatusArgs, sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "qctrl",
    version,
    about = "Synchronize ERP order exports into a queryable order store",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the sync daemon in the foreground (watcher + HTTP API).
    Serve(ServeArgs),

    /// Reconcile a single export file into the database, without the daemon.
    Import(ImportArgs),

    /// Ask a running daemon to run a reconciliation pass now.
    Sync(SyncArgs),

    /// Show a running daemon's pass history and uptime.
    Status(StatusArgs),

    /// List the most recent orders known to a running daemon.
    Orders(OrdersArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => args.run(),
        Commands::Import(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Orders(args) => args.run(),
    }
}
