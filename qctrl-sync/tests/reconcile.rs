//! End-to-end reconciliation behavior against an in-memory order store.

use serde_json::{json, Value};

use qctrl_core::OrderKey;
use qctrl_store::{connect_in_memory, OrderStore};
use qctrl_sync::{reconcile, run_pass};

async fn store() -> OrderStore {
    OrderStore::new(connect_in_memory().await.expect("connect"))
}

fn record(sipno: i64, sipsr: i64, firma: &str, mik: f64) -> Value {
    json!({"sipno": sipno, "sipsr": sipsr, "firma": firma, "mik": mik})
}

#[tokio::test]
async fn first_pass_creates_later_pass_is_a_no_op() {
    let store = store().await;
    let batch = vec![record(100, 1, "A", 5.0), record(100, 2, "A", 3.0)];

    let first = reconcile(&store, batch.clone()).await.expect("first pass");
    assert_eq!(first.created, 2);
    assert_eq!(first.updated, 0);
    assert!(first.errors.is_empty());

    let snapshot = store.list_recent().await.expect("list");

    let second = reconcile(&store, batch).await.expect("second pass");
    assert_eq!(second.created, 0, "idempotent: nothing new");
    assert_eq!(second.updated, 0, "idempotent: nothing changed");

    let after = store.list_recent().await.expect("list");
    assert_eq!(after, snapshot, "store must be byte-for-byte unchanged");
}

#[tokio::test]
async fn changed_record_updates_all_attributes() {
    let store = store().await;
    reconcile(&store, vec![record(100, 1, "A", 5.0)])
        .await
        .expect("seed");

    let summary = reconcile(&store, vec![record(100, 1, "B", 9.0)])
        .await
        .expect("update pass");
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);

    let row = store
        .find_by_key(OrderKey::new(100, 1))
        .await
        .expect("find")
        .expect("row");
    assert_eq!(row.attributes.firma.as_deref(), Some("B"));
    assert_eq!(row.attributes.mik, Some(9.0));
}

#[tokio::test]
async fn duplicate_keys_in_one_batch_collapse_to_last_entry() {
    // One key appears twice: the later quantity wins and the pair counts
    // as a single create.
    let store = store().await;
    let batch = vec![record(100, 1, "A", 5.0), record(100, 1, "A", 7.0)];

    let summary = reconcile(&store, batch).await.expect("pass");
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 0);

    assert_eq!(store.count().await.expect("count"), 1);
    let row = store
        .find_by_key(OrderKey::new(100, 1))
        .await
        .expect("find")
        .expect("row");
    assert_eq!(row.attributes.mik, Some(7.0), "last entry wins");
}

#[tokio::test]
async fn unchanged_record_leaves_modification_marker_untouched() {
    let store = store().await;
    reconcile(&store, vec![record(100, 1, "A", 5.0)])
        .await
        .expect("seed");

    // Plant a marker value; an unchanged record must not disturb it.
    let marker = "1999-12-31T23:59:59+00:00";
    sqlx::query("UPDATE orders SET updated_at = ? WHERE sipno = 100 AND sipsr = 1")
        .bind(marker)
        .execute(store.pool())
        .await
        .expect("plant marker");

    reconcile(&store, vec![record(100, 1, "A", 5.0)])
        .await
        .expect("no-op pass");

    let (updated_at,): (String,) =
        sqlx::query_as("SELECT updated_at FROM orders WHERE sipno = 100 AND sipsr = 1")
            .fetch_one(store.pool())
            .await
            .expect("read marker");
    assert_eq!(updated_at, marker, "skip must not rewrite the row");
}

#[tokio::test]
async fn reconciliation_never_touches_mail_flags() {
    let store = store().await;
    reconcile(&store, vec![record(100, 1, "A", 5.0)])
        .await
        .expect("seed");
    store
        .mark_mail_sent(OrderKey::new(100, 1), chrono::Utc::now())
        .await
        .expect("mark");

    // Attribute change on the same key; the mail flags must survive.
    reconcile(&store, vec![record(100, 1, "B", 2.0)])
        .await
        .expect("update pass");

    let row = store
        .find_by_key(OrderKey::new(100, 1))
        .await
        .expect("find")
        .expect("row");
    assert!(row.mail_sent, "mail_sent is owned by the reporting workflow");
    assert!(row.mail_sent_at.is_some());
    assert_eq!(row.attributes.firma.as_deref(), Some("B"));
}

#[tokio::test]
async fn malformed_record_does_not_abort_the_batch() {
    let store = store().await;
    let batch = vec![
        record(1, 1, "A", 1.0),
        record(2, 1, "B", 2.0),
        json!({"sipno": "not-a-number", "sipsr": 1, "firma": "broken"}),
        record(4, 1, "D", 4.0),
        record(5, 1, "E", 5.0),
    ];

    let summary = reconcile(&store, batch).await.expect("pass");
    assert_eq!(summary.created, 4, "healthy records still apply");
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.errors.len(), 1, "exactly one record error");
    assert_eq!(summary.errors[0].index, 2);
    assert!(summary.errors[0].key.is_none());

    assert_eq!(store.count().await.expect("count"), 4);
}

#[tokio::test]
async fn missing_file_completes_with_zero_counts() {
    let store = store().await;
    let tmp = tempfile::TempDir::new().expect("tempdir");

    let summary = run_pass(&store, &tmp.path().join("q-ctrl.json"))
        .await
        .expect("pass");
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);
    assert!(summary.errors.is_empty());
}

#[tokio::test]
async fn run_pass_reads_export_file_from_disk() {
    let store = store().await;
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let path = tmp.path().join("q-ctrl.json");
    std::fs::write(
        &path,
        serde_json::to_vec(&json!({"wtemp": [
            {"sipno": 100, "sipsr": 1, "firma": "A", "stkno": 0},
            {"sipno": 100, "sipsr": 2, "firma": "A"},
        ]}))
        .expect("encode"),
    )
    .expect("write");

    let summary = run_pass(&store, &path).await.expect("pass");
    assert_eq!(summary.created, 2);

    // Numeric stkno 0 is normalized to "0", not conflated with absence.
    let zero = store
        .find_by_key(OrderKey::new(100, 1))
        .await
        .expect("find")
        .expect("row");
    assert_eq!(zero.attributes.stkno.as_deref(), Some("0"));
    let absent = store
        .find_by_key(OrderKey::new(100, 2))
        .await
        .expect("find")
        .expect("row");
    assert_eq!(absent.attributes.stkno, None);
}

#[tokio::test]
async fn unreachable_store_fails_the_whole_pass() {
    let store = store().await;
    store.pool().close().await;

    let err = reconcile(&store, vec![record(100, 1, "A", 5.0)])
        .await
        .expect_err("pass must fail");
    assert!(
        matches!(err, qctrl_sync::SyncError::Store(_)),
        "a down store is pass-fatal, not a per-record error"
    );
}

#[tokio::test]
async fn schema_error_aborts_before_any_write() {
    let store = store().await;
    let tmp = tempfile::TempDir::new().expect("tempdir");
    let path = tmp.path().join("q-ctrl.json");
    std::fs::write(&path, br#"{"orders": [{"sipno": 1, "sipsr": 1}]}"#).expect("write");

    let err = run_pass(&store, &path).await.expect_err("must fail");
    assert!(matches!(err, qctrl_sync::SyncError::Schema));
    assert_eq!(store.count().await.expect("count"), 0, "no writes attempted");
}
