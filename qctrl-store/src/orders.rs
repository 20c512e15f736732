//! Keyed order repository.
//!
//! All writes carry an explicit `now` timestamp from the caller, so tests can
//! plant marker values and assert that skipped records leave `updated_at`
//! untouched.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use qctrl_core::{IncomingOrder, OrderAttributes, OrderKey, PersistedOrder};

use crate::error::StoreError;

/// Repository over the `orders` table.
#[derive(Debug, Clone)]
pub struct OrderStore {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    sipno: i64,
    sipsr: i64,
    firma: Option<String>,
    musadi: Option<String>,
    mail: Option<String>,
    tarih: Option<String>,
    urunadi: Option<String>,
    out: Option<String>,
    stkno: Option<String>,
    sevktar: Option<String>,
    mik: Option<f64>,
    modul: Option<String>,
    kumas: Option<String>,
    acik: Option<String>,
    ayak: Option<String>,
    kirlent: Option<String>,
    tip: Option<String>,
    mail_sent: bool,
    mail_sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for PersistedOrder {
    fn from(row: OrderRow) -> Self {
        PersistedOrder {
            id: row.id,
            sipno: row.sipno,
            sipsr: row.sipsr,
            attributes: OrderAttributes {
                firma: row.firma,
                musadi: row.musadi,
                mail: row.mail,
                tarih: row.tarih,
                urunadi: row.urunadi,
                out: row.out,
                stkno: row.stkno,
                sevktar: row.sevktar,
                mik: row.mik,
                modul: row.modul,
                kumas: row.kumas,
                acik: row.acik,
                ayak: row.ayak,
                kirlent: row.kirlent,
                tip: row.tip,
            },
            mail_sent: row.mail_sent,
            mail_sent_at: row.mail_sent_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_ORDER: &str = "\
    SELECT id, sipno, sipsr, firma, musadi, mail, tarih, urunadi, out, stkno, \
           sevktar, mik, modul, kumas, acik, ayak, kirlent, tip, \
           mail_sent, mail_sent_at, created_at, updated_at \
    FROM orders";

impl OrderStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap liveness probe; a pass fails fast when the store is unreachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Look up the persisted order for a natural key.
    pub async fn find_by_key(&self, key: OrderKey) -> Result<Option<PersistedOrder>, StoreError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE sipno = ? AND sipsr = ?"))
                .bind(key.sipno)
                .bind(key.sipsr)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(PersistedOrder::from))
    }

    /// Insert a new order with `mail_sent = false`.
    ///
    /// A duplicate key is absorbed as a no-op rather than surfaced as a
    /// uniqueness violation: if another pass won the race, the row already
    /// satisfies the desired end state. Returns whether a row was written.
    pub async fn insert(
        &self,
        order: &IncomingOrder,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let a = &order.attributes;
        let result = sqlx::query(
            r#"
            INSERT INTO orders (
                sipno, sipsr, firma, musadi, mail, tarih, urunadi, out, stkno,
                sevktar, mik, modul, kumas, acik, ayak, kirlent, tip,
                mail_sent, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            ON CONFLICT (sipno, sipsr) DO NOTHING
            "#,
        )
        .bind(order.sipno)
        .bind(order.sipsr)
        .bind(&a.firma)
        .bind(&a.musadi)
        .bind(&a.mail)
        .bind(&a.tarih)
        .bind(&a.urunadi)
        .bind(&a.out)
        .bind(&a.stkno)
        .bind(&a.sevktar)
        .bind(a.mik)
        .bind(&a.modul)
        .bind(&a.kumas)
        .bind(&a.acik)
        .bind(&a.ayak)
        .bind(&a.kirlent)
        .bind(&a.tip)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Overwrite every descriptive attribute of an existing row in one update.
    ///
    /// `mail_sent` / `mail_sent_at` are deliberately absent from the column
    /// list; they belong to the reporting workflow.
    pub async fn update_attributes(
        &self,
        id: i64,
        attributes: &OrderAttributes,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let a = attributes;
        sqlx::query(
            r#"
            UPDATE orders SET
                firma = ?, musadi = ?, mail = ?, tarih = ?, urunadi = ?,
                out = ?, stkno = ?, sevktar = ?, mik = ?, modul = ?,
                kumas = ?, acik = ?, ayak = ?, kirlent = ?, tip = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&a.firma)
        .bind(&a.musadi)
        .bind(&a.mail)
        .bind(&a.tarih)
        .bind(&a.urunadi)
        .bind(&a.out)
        .bind(&a.stkno)
        .bind(&a.sevktar)
        .bind(a.mik)
        .bind(&a.modul)
        .bind(&a.kumas)
        .bind(&a.acik)
        .bind(&a.ayak)
        .bind(&a.kirlent)
        .bind(&a.tip)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Reporting-workflow callback: flag a delivered quality-control report.
    pub async fn mark_mail_sent(
        &self,
        key: OrderKey,
        at: DateTime<Utc>,
    ) -> Result<PersistedOrder, StoreError> {
        let result = sqlx::query(
            "UPDATE orders SET mail_sent = 1, mail_sent_at = ? WHERE sipno = ? AND sipsr = ?",
        )
        .bind(at)
        .bind(key.sipno)
        .bind(key.sipsr)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { key });
        }

        self.find_by_key(key)
            .await?
            .ok_or(StoreError::NotFound { key })
    }

    /// All orders, newest order date first (the export's `tarih` field).
    pub async fn list_recent(&self) -> Result<Vec<PersistedOrder>, StoreError> {
        let rows: Vec<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY tarih DESC, id DESC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(PersistedOrder::from).collect())
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
