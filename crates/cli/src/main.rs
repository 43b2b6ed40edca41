mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use feedload_core::config::{self, Config};
use feedload_core::{IngestError, IngestJob};
use feedload_ingest::{IngestTask, XmlFileSource};
use feedload_storage::TableStore;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before the log filter and clap's env fallbacks are read
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = Config::for_profile(&args.profile);
    if let Some(ref row_tag) = args.row_tag {
        config.ingest.row_tag = row_tag.clone();
    }
    if let Some(ref warehouse) = args.warehouse {
        config.warehouse.root = warehouse.clone();
    }
    config.log_summary();

    // Parameter check happens before the warehouse is touched.
    let job = match IngestJob::from_params(&args.params(), &config.ingest.row_tag) {
        Ok(job) => job,
        Err(e) => fail(e.into()),
    };

    let store = TableStore::from_config(&config).context("failed to open warehouse")?;
    let task = IngestTask::new(Arc::new(XmlFileSource::new()), Arc::new(store));

    match task.run(&job).await {
        Ok(report) => {
            info!(
                table = %report.table,
                rows = report.rows_appended,
                "feedload finished"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => fail(e),
    }
}

/// `RUST_LOG` filter, defaulting to `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn fail(err: IngestError) -> ! {
    error!(error = %err, "ingest failed");
    std::process::exit(err.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn log_filter_comes_from_dotenv_file() {
        std::env::remove_var("RUST_LOG");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RUST_LOG=feedload=debug").unwrap();

        dotenvy::from_path(file.path()).unwrap();
        assert_eq!(env_filter().to_string(), "feedload=debug");
        std::env::remove_var("RUST_LOG");
    }
}
