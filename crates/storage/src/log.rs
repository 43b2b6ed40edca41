//! Per-table commit log.
//!
//! Each append writes `_feedload_log/<version:020>.json` after its data part.
//! A part without a commit entry is not part of the table.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::{PutMode, PutOptions};
use serde::{Deserialize, Serialize};

use crate::backend::WarehouseBackend;
use crate::encode::ColumnSpec;
use crate::error::StorageError;
use crate::table_name::TableName;

pub const LOG_DIR: &str = "_feedload_log";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub version: u64,
    pub committed_at: DateTime<Utc>,
    pub operation: String,
    /// Part file name relative to the table directory.
    pub part: String,
    pub rows: usize,
    /// Full table schema as of this commit.
    pub schema: Vec<ColumnSpec>,
}

pub fn entry_name(version: u64) -> String {
    format!("{:020}.json", version)
}

fn parse_entry_name(file: &str) -> Option<u64> {
    let digits = file.strip_suffix(".json")?;
    if digits.len() != 20 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Reads and writes commit entries for one table.
pub struct CommitLog<'a> {
    backend: &'a WarehouseBackend,
    table: &'a TableName,
}

impl<'a> CommitLog<'a> {
    pub fn new(backend: &'a WarehouseBackend, table: &'a TableName) -> Self {
        Self { backend, table }
    }

    fn log_dir(&self) -> object_store::path::Path {
        self.backend
            .key(&format!("{}/{}", self.table.relative_path(), LOG_DIR))
    }

    fn entry_path(&self, version: u64) -> object_store::path::Path {
        self.backend.key(&format!(
            "{}/{}/{}",
            self.table.relative_path(),
            LOG_DIR,
            entry_name(version)
        ))
    }

    /// Committed versions, ascending. Empty when the table does not exist yet.
    pub async fn versions(&self) -> Result<Vec<u64>, StorageError> {
        let store = self.backend.store();
        let dir = self.log_dir();
        let mut stream = store.list(Some(&dir));

        let mut versions = Vec::new();
        loop {
            match stream.try_next().await {
                Ok(Some(meta)) => {
                    if let Some(v) = meta.location.filename().and_then(parse_entry_name) {
                        versions.push(v);
                    }
                }
                Ok(None) => break,
                Err(object_store::Error::NotFound { .. }) => break,
                Err(e) => return Err(e.into()),
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    pub async fn read(&self, version: u64) -> Result<CommitEntry, StorageError> {
        let data = self
            .backend
            .store()
            .get(&self.entry_path(version))
            .await?
            .bytes()
            .await?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub async fn latest(&self) -> Result<Option<CommitEntry>, StorageError> {
        match self.versions().await?.last() {
            Some(&v) => Ok(Some(self.read(v).await?)),
            None => Ok(None),
        }
    }

    pub async fn entries(&self) -> Result<Vec<CommitEntry>, StorageError> {
        let mut entries = Vec::new();
        for v in self.versions().await? {
            entries.push(self.read(v).await?);
        }
        Ok(entries)
    }

    /// Write an entry with create-only semantics. An existing entry at the
    /// same version means another writer got there first.
    pub async fn commit(&self, entry: &CommitEntry) -> Result<(), StorageError> {
        let store = self.backend.store();
        let path = self.entry_path(entry.version);
        let body = bytes::Bytes::from(serde_json::to_vec_pretty(entry)?);

        let conflict = || StorageError::CommitConflict {
            table: self.table.to_string(),
            version: entry.version,
        };

        match store
            .put_opts(&path, body.clone().into(), PutOptions::from(PutMode::Create))
            .await
        {
            Ok(_) => Ok(()),
            Err(object_store::Error::AlreadyExists { .. }) => Err(conflict()),
            Err(object_store::Error::NotImplemented) => {
                // Store has no conditional put; fall back to check-then-write.
                if store.head(&path).await.is_ok() {
                    return Err(conflict());
                }
                store.put(&path, body.into()).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
