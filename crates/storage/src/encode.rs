//! Records ⇄ Arrow ⇄ Parquet.
//!
//! XML values are all strings, so the only column types are `Utf8` and the
//! UTC microsecond timestamp used by `load_dt`. Lists render as JSON arrays.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringBuilder, TimestampMicrosecondBuilder};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::{Deserialize, Serialize};

use feedload_core::{column_union, FieldValue, Record};

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Utf8,
    TimestampUtc,
}

impl ColumnType {
    pub fn arrow_type(self) -> DataType {
        match self {
            ColumnType::Utf8 => DataType::Utf8,
            ColumnType::TimestampUtc => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: ColumnType,
}

/// Column specs for a batch, in first-seen order.
///
/// A column is a timestamp when every non-null value is one; anything else,
/// including an all-null column, is text.
pub fn infer_columns(records: &[Record]) -> Vec<ColumnSpec> {
    column_union(records)
        .into_iter()
        .map(|name| {
            let mut saw_timestamp = false;
            let mut saw_other = false;
            for value in records.iter().filter_map(|r| r.get(&name)) {
                match value {
                    FieldValue::Timestamp(_) => saw_timestamp = true,
                    FieldValue::Null => {}
                    _ => saw_other = true,
                }
            }
            let data_type = if saw_timestamp && !saw_other {
                ColumnType::TimestampUtc
            } else {
                ColumnType::Utf8
            };
            ColumnSpec { name, data_type }
        })
        .collect()
}

/// Fit a batch onto an existing table schema.
///
/// Every batch column must already exist with the same type; columns the batch
/// lacks are written as nulls. A batch column holding only nulls adopts the
/// table's type. Returns the column order to write, which is the table's.
pub fn align_to_table(
    table: &str,
    records: &[Record],
    batch: &[ColumnSpec],
    existing: &[ColumnSpec],
) -> Result<Vec<ColumnSpec>, StorageError> {
    for col in batch {
        let Some(target) = existing.iter().find(|c| c.name == col.name) else {
            return Err(StorageError::IncompatibleSchema {
                table: table.to_string(),
                detail: format!("column {:?} does not exist in the table", col.name),
            });
        };
        if target.data_type != col.data_type && has_values(records, &col.name) {
            return Err(StorageError::IncompatibleSchema {
                table: table.to_string(),
                detail: format!(
                    "column {:?} is {:?} in the table but {:?} in the batch",
                    col.name, target.data_type, col.data_type
                ),
            });
        }
    }
    Ok(existing.to_vec())
}

fn has_values(records: &[Record], column: &str) -> bool {
    records
        .iter()
        .filter_map(|r| r.get(column))
        .any(|v| !v.is_null())
}

pub fn arrow_schema(columns: &[ColumnSpec]) -> Schema {
    Schema::new(
        columns
            .iter()
            .map(|c| Field::new(&c.name, c.data_type.arrow_type(), true))
            .collect::<Vec<_>>(),
    )
}

/// Build one Arrow batch from records using the given column layout.
pub fn to_record_batch(records: &[Record], columns: &[ColumnSpec]) -> Result<RecordBatch, StorageError> {
    let schema = Arc::new(arrow_schema(columns));
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for col in columns {
        let values = records.iter().map(|r| r.get(&col.name));
        let array: ArrayRef = match col.data_type {
            ColumnType::Utf8 => {
                let mut builder = StringBuilder::with_capacity(records.len(), records.len() * 16);
                for value in values {
                    match value.and_then(FieldValue::render) {
                        Some(s) => builder.append_value(s),
                        None => builder.append_null(),
                    }
                }
                Arc::new(builder.finish())
            }
            ColumnType::TimestampUtc => {
                let mut builder = TimestampMicrosecondBuilder::with_capacity(records.len());
                for value in values {
                    match value {
                        Some(FieldValue::Timestamp(ts)) => builder.append_value(ts.timestamp_micros()),
                        _ => builder.append_null(),
                    }
                }
                Arc::new(builder.finish().with_timezone("UTC"))
            }
        };
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Encode a batch as an in-memory Parquet file (Zstd), with footer metadata.
pub fn encode_parquet(batch: &RecordBatch, metadata: &[(&str, String)]) -> Result<Vec<u8>, StorageError> {
    let kv = metadata
        .iter()
        .map(|(k, v)| parquet::format::KeyValue::new(k.to_string(), Some(v.clone())))
        .collect();
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .set_key_value_metadata(Some(kv))
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(buf)
}

pub fn decode_parquet(data: Bytes) -> Result<Vec<RecordBatch>, StorageError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}
