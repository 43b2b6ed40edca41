use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Row tag used when none is configured.
pub const DEFAULT_ROW_TAG: &str = "item";

/// Raw invocation parameters as handed over by the caller. Every field defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParams {
    pub source_path: String,
    pub target_table: String,
    pub source_tag: String,
}

impl TaskParams {
    pub fn new(
        source_path: impl Into<String>,
        target_table: impl Into<String>,
        source_tag: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target_table: target_table.into(),
            source_tag: source_tag.into(),
        }
    }
}

/// A validated ingestion job. Only obtainable through [`IngestJob::from_params`],
/// so holding one means `source_path` and `target_table` are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestJob {
    source_path: String,
    target_table: String,
    source_tag: String,
    row_tag: String,
}

impl IngestJob {
    /// Validate parameter presence. `source_tag` may be empty.
    pub fn from_params(params: &TaskParams, row_tag: &str) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        if params.source_path.is_empty() {
            missing.push("source_path");
        }
        if params.target_table.is_empty() {
            missing.push("target_table");
        }
        if !missing.is_empty() {
            return Err(ConfigError::MissingParameters(missing));
        }

        // Rows are matched by local name, so a prefixed tag would never match.
        let row_tag = row_tag.trim();
        if row_tag.is_empty() || row_tag.contains(|c: char| c.is_whitespace() || c == ':') {
            return Err(ConfigError::InvalidRowTag(row_tag.to_string()));
        }

        Ok(Self {
            source_path: params.source_path.clone(),
            target_table: params.target_table.clone(),
            source_tag: params.source_tag.clone(),
            row_tag: row_tag.to_string(),
        })
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    pub fn target_table(&self) -> &str {
        &self.target_table
    }

    pub fn source_tag(&self) -> &str {
        &self.source_tag
    }

    pub fn row_tag(&self) -> &str {
        &self.row_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_params_build_job() {
        let params = TaskParams::new("/data/orders.xml", "bronze.orders", "orders_feed");
        let job = IngestJob::from_params(&params, DEFAULT_ROW_TAG).unwrap();
        assert_eq!(job.source_path(), "/data/orders.xml");
        assert_eq!(job.target_table(), "bronze.orders");
        assert_eq!(job.source_tag(), "orders_feed");
        assert_eq!(job.row_tag(), "item");
    }

    #[test]
    fn empty_source_path_is_rejected() {
        let params = TaskParams::new("", "bronze.orders", "orders_feed");
        let err = IngestJob::from_params(&params, DEFAULT_ROW_TAG).unwrap_err();
        assert_eq!(err, ConfigError::MissingParameters(vec!["source_path"]));
    }

    #[test]
    fn empty_target_table_is_rejected() {
        let params = TaskParams::new("/data/orders.xml", "", "orders_feed");
        let err = IngestJob::from_params(&params, DEFAULT_ROW_TAG).unwrap_err();
        assert_eq!(err, ConfigError::MissingParameters(vec!["target_table"]));
    }

    #[test]
    fn default_params_report_both_missing() {
        let err = IngestJob::from_params(&TaskParams::default(), DEFAULT_ROW_TAG).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingParameters(vec!["source_path", "target_table"])
        );
    }

    #[test]
    fn empty_source_tag_is_allowed() {
        let params = TaskParams::new("/data/orders.xml", "bronze.orders", "");
        let job = IngestJob::from_params(&params, DEFAULT_ROW_TAG).unwrap();
        assert_eq!(job.source_tag(), "");
    }

    #[test]
    fn blank_row_tag_is_rejected() {
        let params = TaskParams::new("/data/orders.xml", "bronze.orders", "t");
        assert!(matches!(
            IngestJob::from_params(&params, "  "),
            Err(ConfigError::InvalidRowTag(_))
        ));
    }

    #[test]
    fn prefixed_row_tag_is_rejected() {
        let params = TaskParams::new("/data/orders.xml", "bronze.orders", "t");
        assert_eq!(
            IngestJob::from_params(&params, "o:item").unwrap_err(),
            ConfigError::InvalidRowTag("o:item".into())
        );
    }
}
