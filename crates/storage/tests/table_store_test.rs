/// Integration tests for the local-warehouse table store: appends, commit log,
/// schema alignment, and reading parts back.

use arrow::array::{Array, StringArray, TimestampMicrosecondArray};
use chrono::{TimeZone, Utc};

use feedload_core::{FieldValue, Record, RecordSink, WriteError};
use feedload_storage::{ColumnType, StorageError, TableStore};

// ============================================================================
// Test Helpers
// ============================================================================

fn order(id: &str, source: &str) -> Record {
    let mut r = Record::new();
    r.set("id", FieldValue::Text(id.to_string()));
    r.set("amount", FieldValue::Text("1.00".to_string()));
    r.set(
        "load_dt",
        FieldValue::Timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()),
    );
    r.set("source", FieldValue::Text(source.to_string()));
    r
}

fn orders(n: usize, source: &str) -> Vec<Record> {
    (0..n).map(|i| order(&i.to_string(), source)).collect()
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn first_append_creates_table() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();

    let summary = store.append_records("bronze.orders", &orders(3, "feed")).await.unwrap();
    assert_eq!(summary.table, "bronze.orders");
    assert_eq!(summary.version, Some(0));
    assert_eq!(summary.rows, 3);

    let table_dir = dir.path().join("bronze/orders");
    assert!(table_dir.join("_feedload_log/00000000000000000000.json").is_file());
    assert!(table_dir.join(summary.part.unwrap()).is_file());

    let history = store.history("bronze.orders").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].operation, "APPEND");
    let types: Vec<(&str, ColumnType)> = history[0]
        .schema
        .iter()
        .map(|c| (c.name.as_str(), c.data_type))
        .collect();
    assert_eq!(
        types,
        vec![
            ("id", ColumnType::Utf8),
            ("amount", ColumnType::Utf8),
            ("load_dt", ColumnType::TimestampUtc),
            ("source", ColumnType::Utf8),
        ]
    );
}

#[tokio::test]
async fn appends_accumulate_without_dedup() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();
    let batch = orders(5, "feed");

    store.append_records("bronze.orders", &batch).await.unwrap();
    assert_eq!(store.row_count("bronze.orders").await.unwrap(), 5);
    let second = store.append_records("bronze.orders", &batch).await.unwrap();
    assert_eq!(second.version, Some(1));
    assert_eq!(store.row_count("bronze.orders").await.unwrap(), 10);

    let batches = store.scan("bronze.orders").await.unwrap();
    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(rows, 10);
}

#[tokio::test]
async fn scan_returns_audit_columns() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();
    store.append_records("orders", &orders(2, "orders_feed")).await.unwrap();

    for batch in store.scan("default.orders").await.unwrap() {
        let source = batch.column_by_name("source").unwrap();
        let source = source.as_any().downcast_ref::<StringArray>().unwrap();
        let load_dt = batch.column_by_name("load_dt").unwrap();
        let load_dt = load_dt
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .unwrap();
        for i in 0..batch.num_rows() {
            assert_eq!(source.value(i), "orders_feed");
            assert!(!load_dt.is_null(i));
        }
    }
}

#[tokio::test]
async fn missing_columns_are_null_filled_in_table_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();
    store.append_records("bronze.orders", &orders(1, "feed")).await.unwrap();

    let mut partial = Record::new();
    partial.set("id", FieldValue::Text("99".into()));
    partial.set("source", FieldValue::Text("feed".into()));
    store.append_records("bronze.orders", &[partial]).await.unwrap();

    let batches = store.scan("bronze.orders").await.unwrap();
    let last = batches.last().unwrap();
    assert_eq!(last.schema().field(1).name(), "amount");
    assert!(last.column_by_name("amount").unwrap().is_null(0));
    assert!(last.column_by_name("load_dt").unwrap().is_null(0));
}

#[tokio::test]
async fn new_column_is_rejected_and_table_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();
    store.append_records("bronze.orders", &orders(2, "feed")).await.unwrap();

    let mut extra = order("3", "feed");
    extra.set("discount", FieldValue::Text("0.1".into()));
    let err = store.append("bronze.orders", &[extra]).await.unwrap_err();
    assert!(matches!(err, WriteError::IncompatibleSchema { .. }));

    assert_eq!(store.row_count("bronze.orders").await.unwrap(), 2);
    assert_eq!(store.history("bronze.orders").await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_batch_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();

    let summary = store.append_records("bronze.orders", &[]).await.unwrap();
    assert_eq!(summary.rows, 0);
    assert_eq!(summary.version, None);
    assert!(store.history("bronze.orders").await.unwrap().is_empty());
    assert!(!dir.path().join("bronze/orders").exists());
}

#[tokio::test]
async fn invalid_table_name_is_a_write_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();

    let err = store.append_records("bronze..orders", &orders(1, "f")).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidTableName(_)));

    let err = store.append("a/b", &orders(1, "f")).await.unwrap_err();
    assert!(matches!(err, WriteError::InvalidTable(_)));
}

#[tokio::test]
async fn unknown_table_has_no_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::local(dir.path()).unwrap();
    assert_eq!(store.row_count("silver.nothing").await.unwrap(), 0);
    assert!(store.scan("silver.nothing").await.unwrap().is_empty());
}
