use thiserror::Error;

use feedload_core::WriteError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("commit log error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid table name {0:?}")]
    InvalidTableName(String),

    #[error("incompatible schema for table {table}: {detail}")]
    IncompatibleSchema { table: String, detail: String },

    #[error("commit conflict on table {table} at version {version}")]
    CommitConflict { table: String, version: u64 },

    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl From<StorageError> for WriteError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidTableName(name) => WriteError::InvalidTable(name),
            StorageError::IncompatibleSchema { table, detail } => {
                WriteError::IncompatibleSchema { table, detail }
            }
            StorageError::CommitConflict { table, version } => {
                WriteError::CommitConflict { table, version }
            }
            other => WriteError::Storage(other.to_string()),
        }
    }
}
