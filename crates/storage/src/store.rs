use std::path::Path;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use feedload_core::{AppendSummary, Config, Record, RecordSink, WriteError};

use crate::backend::{LocalBackend, WarehouseBackend};
use crate::encode::{align_to_table, decode_parquet, encode_parquet, infer_columns, to_record_batch};
use crate::error::StorageError;
use crate::log::{CommitEntry, CommitLog};
use crate::table_name::TableName;

/// Append-only Parquet tables with a commit log, on a local or S3 warehouse.
pub struct TableStore {
    backend: WarehouseBackend,
}

impl TableStore {
    pub fn new(backend: WarehouseBackend) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        Ok(Self::new(WarehouseBackend::from_config(config)?))
    }

    /// Local warehouse rooted at `root` (created if missing).
    pub fn local(root: &Path) -> Result<Self, StorageError> {
        Ok(Self::new(WarehouseBackend::Local(LocalBackend::new(root)?)))
    }

    pub fn backend(&self) -> &WarehouseBackend {
        &self.backend
    }

    /// Append records as one new part and commit. Zero records write nothing.
    pub async fn append_records(
        &self,
        table: &str,
        records: &[Record],
    ) -> Result<AppendSummary, StorageError> {
        let name = TableName::parse(table)?;
        if records.is_empty() {
            info!(table = %name, "nothing to append");
            return Ok(AppendSummary::empty(name.to_string()));
        }

        let start = Instant::now();
        let log = CommitLog::new(&self.backend, &name);
        let latest = log.latest().await?;

        let batch_columns = infer_columns(records);
        let (columns, version) = match &latest {
            Some(entry) => (
                align_to_table(&name.to_string(), records, &batch_columns, &entry.schema)?,
                entry.version + 1,
            ),
            None => (batch_columns, 0),
        };

        let batch = to_record_batch(records, &columns)?;
        let data = encode_parquet(
            &batch,
            &[
                ("feedload.table", name.to_string()),
                ("feedload.version", version.to_string()),
            ],
        )?;

        let part = format!("part-{:05}-{}.zstd.parquet", version, Uuid::new_v4());
        let part_path = self
            .backend
            .key(&format!("{}/{}", name.relative_path(), part));
        let size = data.len();
        self.backend
            .store()
            .put(&part_path, bytes::Bytes::from(data).into())
            .await?;
        debug!(path = %part_path, bytes = size, "wrote part");

        let entry = CommitEntry {
            version,
            committed_at: Utc::now(),
            operation: "APPEND".to_string(),
            part: part.clone(),
            rows: records.len(),
            schema: columns,
        };
        log.commit(&entry).await?;

        info!(
            "Appended {} rows to {} (version {}, {:.2}s)",
            entry.rows,
            name,
            version,
            start.elapsed().as_secs_f64()
        );

        Ok(AppendSummary {
            table: name.to_string(),
            version: Some(version),
            rows: entry.rows,
            part: Some(part),
        })
    }

    /// All commits of a table, oldest first. Empty if the table does not exist.
    pub async fn history(&self, table: &str) -> Result<Vec<CommitEntry>, StorageError> {
        let name = TableName::parse(table)?;
        CommitLog::new(&self.backend, &name).entries().await
    }

    pub async fn row_count(&self, table: &str) -> Result<usize, StorageError> {
        Ok(self.history(table).await?.iter().map(|e| e.rows).sum())
    }

    /// Read every committed part of a table.
    pub async fn scan(&self, table: &str) -> Result<Vec<RecordBatch>, StorageError> {
        let name = TableName::parse(table)?;
        let entries = CommitLog::new(&self.backend, &name).entries().await?;

        let mut batches = Vec::new();
        for entry in entries {
            let path = self
                .backend
                .key(&format!("{}/{}", name.relative_path(), entry.part));
            let data = self.backend.store().get(&path).await?.bytes().await?;
            batches.extend(decode_parquet(data)?);
        }
        Ok(batches)
    }
}

#[async_trait]
impl RecordSink for TableStore {
    async fn append(&self, table: &str, records: &[Record]) -> Result<AppendSummary, WriteError> {
        Ok(self.append_records(table, records).await?)
    }
}
