use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Audit column holding the batch load timestamp.
pub const LOAD_DT_COLUMN: &str = "load_dt";

/// Audit column holding the source tag.
pub const SOURCE_COLUMN: &str = "source";

/// One row parsed from a source. Columns keep the order they were first seen in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub fields: IndexMap<String, FieldValue>,
}

/// Field values. XML data arrives as text; timestamps only come from audit columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// A path that repeated inside one record. Empty occurrences stay as None.
    List(Vec<Option<String>>),
    Timestamp(DateTime<Utc>),
    Null,
}

impl FieldValue {
    /// Extract as string, returning None for anything but Text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Render as a single string cell. Lists become a JSON array with `null` holes.
    pub fn render(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::List(items) => {
                Some(serde_json::to_string(items).unwrap_or_else(|_| {
                    items
                        .iter()
                        .map(|i| i.as_deref().unwrap_or(""))
                        .collect::<Vec<_>>()
                        .join(",")
                }))
            }
            FieldValue::Timestamp(ts) => Some(ts.to_rfc3339()),
            FieldValue::Null => None,
        }
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.fields.get(column)
    }

    /// Set a column, replacing any earlier value and moving it to the end.
    pub fn set(&mut self, column: impl Into<String>, value: FieldValue) {
        let column = column.into();
        self.fields.shift_remove(&column);
        self.fields.insert(column, value);
    }

    /// Add a value under `column`, turning repeats into a List.
    pub fn push_value(&mut self, column: impl Into<String>, value: FieldValue) {
        let column = column.into();
        let Some(existing) = self.fields.get_mut(&column) else {
            self.fields.insert(column, value);
            return;
        };

        let incoming = value.render();
        match existing {
            FieldValue::List(items) => items.push(incoming),
            other => {
                *other = FieldValue::List(vec![other.render(), incoming]);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Union of column names across records, in first-seen order.
pub fn column_union(records: &[Record]) -> Vec<String> {
    let mut seen: IndexMap<&str, ()> = IndexMap::new();
    for record in records {
        for name in record.fields.keys() {
            seen.entry(name.as_str()).or_insert(());
        }
    }
    seen.into_keys().map(str::to_string).collect()
}
