use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use feedload_core::{IngestError, IngestJob, RecordSink, RecordSource, TaskParams};

use crate::audit::tag_records;

/// Outcome of one successful ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub table: String,
    pub source_tag: String,
    pub load_dt: DateTime<Utc>,
    pub records_read: usize,
    pub rows_appended: usize,
    /// Table version created by the append, None if nothing was written.
    pub version: Option<u64>,
}

/// Read → tag → append. One read and one write per run; any failure aborts the run.
pub struct IngestTask {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RecordSink>,
}

impl IngestTask {
    pub fn new(source: Arc<dyn RecordSource>, sink: Arc<dyn RecordSink>) -> Self {
        Self { source, sink }
    }

    /// Validate raw parameters, then run. Missing parameters fail before any I/O.
    pub async fn run_params(
        &self,
        params: &TaskParams,
        row_tag: &str,
    ) -> Result<IngestReport, IngestError> {
        let job = IngestJob::from_params(params, row_tag)?;
        self.run(&job).await
    }

    /// Run with `load_dt` taken from the wall clock at task start.
    pub async fn run(&self, job: &IngestJob) -> Result<IngestReport, IngestError> {
        self.run_at(job, Utc::now()).await
    }

    /// Run with an explicit batch timestamp.
    pub async fn run_at(
        &self,
        job: &IngestJob,
        load_dt: DateTime<Utc>,
    ) -> Result<IngestReport, IngestError> {
        let start = Instant::now();
        info!("Ingesting {} into {}...", job.source_tag(), job.target_table());

        let records = self.source.read(job.source_path(), job.row_tag()).await?;
        let records_read = records.len();
        if records_read == 0 {
            warn!(
                source_path = %job.source_path(),
                row_tag = %job.row_tag(),
                "source produced no <{}> records",
                job.row_tag()
            );
        }

        let tagged = tag_records(records, load_dt, job.source_tag());
        let summary = self.sink.append(job.target_table(), &tagged).await?;

        info!(
            table = %summary.table,
            rows = summary.rows,
            version = ?summary.version,
            "Ingest complete in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        Ok(IngestReport {
            table: summary.table,
            source_tag: job.source_tag().to_string(),
            load_dt,
            records_read,
            rows_appended: summary.rows,
            version: summary.version,
        })
    }
}
