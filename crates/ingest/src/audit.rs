use chrono::{DateTime, Utc};

use feedload_core::{FieldValue, Record, LOAD_DT_COLUMN, SOURCE_COLUMN};

/// Append the `load_dt` and `source` audit columns to every record.
///
/// All records share the same `load_dt`. A source field that already uses one
/// of these names is replaced, and the audit columns always end up last.
pub fn tag_records(records: Vec<Record>, load_dt: DateTime<Utc>, source_tag: &str) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            record.set(LOAD_DT_COLUMN, FieldValue::Timestamp(load_dt));
            record.set(SOURCE_COLUMN, FieldValue::Text(source_tag.to_string()));
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(pairs: &[(&str, &str)]) -> Record {
        let mut r = Record::new();
        for (k, v) in pairs {
            r.set(*k, FieldValue::Text(v.to_string()));
        }
        r
    }

    #[test]
    fn every_record_gets_identical_audit_values() {
        let load_dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let tagged = tag_records(
            vec![rec(&[("id", "1")]), rec(&[("id", "2")]), rec(&[])],
            load_dt,
            "orders_feed",
        );

        assert_eq!(tagged.len(), 3);
        for r in &tagged {
            assert_eq!(r.get(LOAD_DT_COLUMN), Some(&FieldValue::Timestamp(load_dt)));
            assert_eq!(r.get(SOURCE_COLUMN).and_then(|v| v.as_str()), Some("orders_feed"));
        }
    }

    #[test]
    fn audit_columns_replace_source_fields_and_go_last() {
        let load_dt = Utc::now();
        let tagged = tag_records(
            vec![rec(&[("source", "upstream"), ("id", "1"), ("load_dt", "yesterday")])],
            load_dt,
            "feed",
        );
        let names: Vec<&str> = tagged[0].fields.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["id", "load_dt", "source"]);
        assert_eq!(tagged[0].get("source").and_then(|v| v.as_str()), Some("feed"));
    }

    #[test]
    fn empty_tag_is_written_as_empty_string() {
        let tagged = tag_records(vec![rec(&[("id", "1")])], Utc::now(), "");
        assert_eq!(tagged[0].get(SOURCE_COLUMN), Some(&FieldValue::Text(String::new())));
    }
}
