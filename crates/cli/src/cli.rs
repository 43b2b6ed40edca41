use std::path::PathBuf;

use clap::Parser;

use feedload_core::TaskParams;

/// Load a row-tagged XML feed into an append-only table.
///
/// Each record is stamped with `load_dt` (one timestamp per run) and
/// `source` (the given tag) before it is appended.
#[derive(Parser, Debug)]
#[command(name = "feedload", version, about)]
pub struct CliArgs {
    /// XML file or directory of XML files to load
    #[arg(long, env = "SOURCE_PATH", default_value = "")]
    pub source_path: String,

    /// Destination table, e.g. bronze.orders
    #[arg(long, env = "TARGET_TABLE", default_value = "")]
    pub target_table: String,

    /// Value written to the `source` column of every row
    #[arg(long, env = "SOURCE_TAG", default_value = "")]
    pub source_tag: String,

    /// XML element whose instances become rows (overrides ROW_TAG)
    #[arg(long)]
    pub row_tag: Option<String>,

    /// Local warehouse root (overrides WAREHOUSE_DIR)
    #[arg(long)]
    pub warehouse: Option<PathBuf>,

    /// Config profile; keys are looked up as {PROFILE}_{KEY} first
    #[arg(long, env = "FEEDLOAD_PROFILE", default_value = "")]
    pub profile: String,
}

impl CliArgs {
    pub fn params(&self) -> TaskParams {
        TaskParams::new(&self.source_path, &self.target_table, &self.source_tag)
    }
}
