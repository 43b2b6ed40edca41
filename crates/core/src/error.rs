use std::path::PathBuf;

use thiserror::Error;

/// A required invocation parameter was empty. Raised before any I/O.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),

    #[error("Invalid row tag: {0:?}")]
    InvalidRowTag(String),
}

/// Failure to locate or parse the source dataset.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("source path does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("no XML files found under {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in {}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Failure to append to the destination table.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("invalid table name: {0}")]
    InvalidTable(String),

    #[error("incompatible schema for table {table}: {detail}")]
    IncompatibleSchema { table: String, detail: String },

    #[error("commit conflict on table {table} at version {version}")]
    CommitConflict { table: String, version: u64 },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Umbrella error for one ingestion run. Every variant is fatal.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("read error: {0}")]
    Read(#[from] ReadError),

    #[error("write error: {0}")]
    Write(#[from] WriteError),
}

impl IngestError {
    /// Process exit code reported by the binary for this failure class.
    pub fn exit_code(&self) -> i32 {
        match self {
            IngestError::Config(_) => 2,
            IngestError::Read(_) => 3,
            IngestError::Write(_) => 4,
        }
    }
}
