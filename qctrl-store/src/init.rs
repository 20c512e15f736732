//! Connection and schema initialization.
//!
//! The schema is created idempotently on every connect; there is no separate
//! migration step. WAL mode keeps the reconciliation writer from blocking the
//! request-serving readers.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{io_err, StoreError};

/// Open (creating if necessary) the order database at `db_path`.
pub async fn connect(db_path: &Path) -> Result<SqlitePool, StoreError> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // One writer (the reconciliation pass) plus concurrent API readers.
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_orders_table(&pool).await?;

    if newly_created {
        info!(path = %db_path.display(), "initialized new order database");
    } else {
        info!(path = %db_path.display(), "opened existing order database");
    }

    Ok(pool)
}

/// In-memory database with the full schema, for tests and one-off tooling.
///
/// A single connection is forced so every caller sees the same database.
pub async fn connect_in_memory() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    create_orders_table(&pool).await?;
    Ok(pool)
}

async fn create_orders_table(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sipno        INTEGER NOT NULL,
            sipsr        INTEGER NOT NULL,
            firma        TEXT,
            musadi       TEXT,
            mail         TEXT,
            tarih        TEXT,
            urunadi      TEXT,
            out          TEXT,
            stkno        TEXT,
            sevktar      TEXT,
            mik          REAL,
            modul        TEXT,
            kumas        TEXT,
            acik         TEXT,
            ayak         TEXT,
            kirlent      TEXT,
            tip          TEXT,
            mail_sent    INTEGER NOT NULL DEFAULT 0,
            mail_sent_at TEXT,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL,
            UNIQUE (sipno, sipsr)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
