use std::fmt;

use crate::error::StorageError;
use crate::log::LOG_DIR;

/// Schema used when a table name has a single part.
pub const DEFAULT_SCHEMA: &str = "default";

/// A parsed `[catalog.]schema.table` identifier, lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub catalog: Option<String>,
    pub schema: String,
    pub table: String,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidTableName(raw.to_string());

        let parts: Vec<String> = raw
            .trim()
            .split('.')
            .map(|p| p.trim_matches('`').to_ascii_lowercase())
            .collect();
        // A segment named like the commit log dir would nest inside another table's log.
        if parts.iter().any(|p| !is_identifier(p) || p == LOG_DIR) {
            return Err(invalid());
        }

        match parts.as_slice() {
            [table] => Ok(Self {
                catalog: None,
                schema: DEFAULT_SCHEMA.to_string(),
                table: table.clone(),
            }),
            [schema, table] => Ok(Self {
                catalog: None,
                schema: schema.clone(),
                table: table.clone(),
            }),
            [catalog, schema, table] => Ok(Self {
                catalog: Some(catalog.clone()),
                schema: schema.clone(),
                table: table.clone(),
            }),
            _ => Err(invalid()),
        }
    }

    /// Relative location of the table under the warehouse root.
    pub fn relative_path(&self) -> String {
        match &self.catalog {
            Some(catalog) => format!("{}/{}/{}", catalog, self.schema, self.table),
            None => format!("{}/{}", self.schema, self.table),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.catalog {
            Some(catalog) => write!(f, "{}.{}.{}", catalog, self.schema, self.table),
            None => write!(f, "{}.{}", self.schema, self.table),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_part_name() {
        let name = TableName::parse("bronze.orders").unwrap();
        assert_eq!(name.schema, "bronze");
        assert_eq!(name.table, "orders");
        assert_eq!(name.relative_path(), "bronze/orders");
        assert_eq!(name.to_string(), "bronze.orders");
    }

    #[test]
    fn single_part_uses_default_schema() {
        let name = TableName::parse("Orders").unwrap();
        assert_eq!(name.to_string(), "default.orders");
    }

    #[test]
    fn three_part_and_backticks() {
        let name = TableName::parse("`main`.bronze.`raw_orders`").unwrap();
        assert_eq!(name.catalog.as_deref(), Some("main"));
        assert_eq!(name.relative_path(), "main/bronze/raw_orders");
    }

    #[test]
    fn rejects_bad_names() {
        for bad in ["", "a..b", "a.b.c.d", "../etc", "bronze.or ders", "bronze/orders"] {
            assert!(
                matches!(TableName::parse(bad), Err(StorageError::InvalidTableName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_log_dir_segment() {
        for bad in ["c.x._feedload_log", "x._FEEDLOAD_LOG", "_feedload_log.t"] {
            assert!(
                matches!(TableName::parse(bad), Err(StorageError::InvalidTableName(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
