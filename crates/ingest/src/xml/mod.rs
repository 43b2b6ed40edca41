pub mod parser;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use feedload_core::{ReadError, Record, RecordSource};

pub use parser::{parse_records, ParseError, VALUE_COLUMN};

/// Reads row-tagged XML from a local file or a directory of `.xml` files.
#[derive(Debug, Clone, Default)]
pub struct XmlFileSource;

impl XmlFileSource {
    pub fn new() -> Self {
        Self
    }

    /// Accept plain paths and `file://` URLs.
    pub fn resolve(location: &str) -> PathBuf {
        PathBuf::from(location.strip_prefix("file://").unwrap_or(location))
    }

    /// Expand a location to the XML files it covers, sorted by path.
    pub async fn discover(path: &Path) -> Result<Vec<PathBuf>, ReadError> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ReadError::NotFound(path.to_path_buf())
            } else {
                ReadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        if meta.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(path).follow_links(true) {
            let entry = entry.map_err(|e| ReadError::Io {
                path: e.path().unwrap_or(path).to_path_buf(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            })?;
            if entry.file_type().is_file() && is_xml(entry.path()) {
                files.push(entry.into_path());
            }
        }

        if files.is_empty() {
            return Err(ReadError::NoInputFiles(path.to_path_buf()));
        }
        files.sort();
        Ok(files)
    }

    async fn read_file(path: &Path, row_tag: &str) -> Result<Vec<Record>, ReadError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| ReadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        parse_records(&bytes, row_tag).map_err(|e| ReadError::Malformed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

#[async_trait]
impl RecordSource for XmlFileSource {
    async fn read(&self, location: &str, row_tag: &str) -> Result<Vec<Record>, ReadError> {
        let root = Self::resolve(location);
        let files = Self::discover(&root).await?;

        let mut records = Vec::new();
        for file in &files {
            let parsed = Self::read_file(file, row_tag).await?;
            debug!(path = %file.display(), rows = parsed.len(), "parsed XML file");
            records.extend(parsed);
        }

        info!(
            "Read {} records from {} file(s) under {}",
            records.len(),
            files.len(),
            root.display()
        );
        Ok(records)
    }
}
