use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ReadError, WriteError};
use crate::record::Record;

/// Capability for loading records from a location.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Read every record at `location`, treating each `row_tag` element as one row.
    async fn read(&self, location: &str, row_tag: &str) -> Result<Vec<Record>, ReadError>;
}

/// Capability for appending records to a named table.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append `records` to `table`. Never updates or deletes existing rows.
    async fn append(&self, table: &str, records: &[Record]) -> Result<AppendSummary, WriteError>;
}

/// What a sink reports after an append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendSummary {
    pub table: String,
    /// Commit version written, or None when there was nothing to write.
    pub version: Option<u64>,
    pub rows: usize,
    /// Location of the data written, if any.
    pub part: Option<String>,
}

impl AppendSummary {
    pub fn empty(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            version: None,
            rows: 0,
            part: None,
        }
    }
}
