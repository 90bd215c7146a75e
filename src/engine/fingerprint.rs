//! Dataset fingerprint - the cache key for a run.
//!
//! The shape part hashes row counts, the sorted column-name sets of both
//! tables and the identifier. The optional content part hashes every row's
//! canonical encoding and combines the per-row digests after sorting them, so
//! the key is independent of row order but not of cell values.
//!
//! [`scoped_key`] binds a dataset fingerprint to the section ids and sample
//! thresholds that produced a bundle, so engines with different registries
//! or settings never share cache entries.

use crate::config::ExecutionConfig;
use crate::dataset::{Dataset, Table};
use serde_json::{json, Value};

/// Compute the cache key for `dataset`.
///
/// With `content_digest` off, two datasets with the same shape and identifier
/// share a key regardless of their cell values.
pub fn fingerprint(dataset: &Dataset, content_digest: bool) -> String {
    let mut key = shape_signature(dataset);
    if content_digest {
        key.push('|');
        key.push_str(&table_digest(dataset.events()));
        key.push('|');
        key.push_str(&dataset.phases().map(table_digest).unwrap_or_default());
    }
    format!("{:x}", md5::compute(key.as_bytes()))
}

/// Cache key for a bundle computed from `dataset_key` by `section_ids` in
/// registry order under the thresholds in `execution`.
///
/// Worker count does not change results and is left out.
pub fn scoped_key(dataset_key: &str, section_ids: &[String], execution: &ExecutionConfig) -> String {
    let scope = json!({
        "sections": section_ids,
        "min_player_actions": execution.min_player_actions,
        "accurate_passer_min_passes": execution.accurate_passer_min_passes,
    });
    format!("{:x}", md5::compute(format!("{}|{}", dataset_key, scope).as_bytes()))
}

fn sorted_columns(table: Option<&Table>) -> Vec<&str> {
    let mut columns: Vec<&str> = table
        .map(|t| t.columns().iter().map(String::as_str).collect())
        .unwrap_or_default();
    columns.sort_unstable();
    columns
}

fn shape_signature(dataset: &Dataset) -> String {
    let events_columns = sorted_columns(Some(dataset.events()));
    let phases_columns = sorted_columns(dataset.phases());
    // JSON arrays keep column names with separators unambiguous
    format!(
        "{}_{}_{}_{}_{}",
        dataset.total_events(),
        Value::from(events_columns),
        dataset.total_phases(),
        Value::from(phases_columns),
        dataset.identifier().unwrap_or_default(),
    )
}

/// Order-independent digest of a table's cell values.
fn table_digest(table: &Table) -> String {
    let mut rows: Vec<[u8; 16]> = table
        .rows()
        .iter()
        .map(|row| {
            // Map keys serialize sorted, nulls are dropped so an explicit null
            // and an absent field hash the same
            let canonical: serde_json::Map<String, Value> = row
                .fields()
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            md5::compute(Value::Object(canonical).to_string().as_bytes()).0
        })
        .collect();
    rows.sort_unstable();

    let mut ctx = md5::Context::new();
    for digest in &rows {
        ctx.consume(digest);
    }
    format!("{:x}", ctx.compute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn table(values: &[i64]) -> Table {
        Table::from_records(
            values
                .iter()
                .map(|v| Record::new().with("minute_start", *v).with("player_id", v % 3))
                .collect(),
        )
    }

    fn dataset(values: &[i64], id: Option<&str>) -> Dataset {
        Dataset::new(table(values), Some(table(&[1, 2])), id.map(str::to_string))
    }

    #[test]
    fn test_same_input_same_key() {
        let a = dataset(&[1, 2, 3], Some("match_001"));
        let b = dataset(&[1, 2, 3], Some("match_001"));
        assert_eq!(fingerprint(&a, true), fingerprint(&b, true));
        assert_eq!(fingerprint(&a, false), fingerprint(&b, false));
        assert_eq!(fingerprint(&a, true).len(), 32);
    }

    #[test]
    fn test_row_order_does_not_matter() {
        let a = dataset(&[1, 2, 3], Some("m"));
        let b = dataset(&[3, 1, 2], Some("m"));
        assert_eq!(fingerprint(&a, true), fingerprint(&b, true));
    }

    #[test]
    fn test_identifier_changes_key() {
        let a = dataset(&[1, 2, 3], Some("match_001"));
        let b = dataset(&[1, 2, 3], Some("match_002"));
        let none = dataset(&[1, 2, 3], None);
        assert_ne!(fingerprint(&a, false), fingerprint(&b, false));
        assert_ne!(fingerprint(&a, false), fingerprint(&none, false));
    }

    #[test]
    fn test_shape_changes_key() {
        let a = dataset(&[1, 2, 3], Some("m"));
        let more_rows = dataset(&[1, 2, 3, 4], Some("m"));
        assert_ne!(fingerprint(&a, false), fingerprint(&more_rows, false));

        let extra_column = Dataset::new(
            Table::from_records(vec![Record::new().with("minute_start", 1).with("x", 1); 3]),
            Some(table(&[1, 2])),
            Some("m".to_string()),
        );
        assert_ne!(fingerprint(&a, false), fingerprint(&extra_column, false));
    }

    #[test]
    fn test_content_digest_separates_same_shape() {
        let a = dataset(&[1, 2, 3], Some("m"));
        let b = dataset(&[4, 5, 6], Some("m"));
        assert_eq!(fingerprint(&a, false), fingerprint(&b, false));
        assert_ne!(fingerprint(&a, true), fingerprint(&b, true));
    }

    #[test]
    fn test_scoped_key_tracks_sections_and_thresholds() {
        let key = fingerprint(&dataset(&[1, 2, 3], Some("m")), true);
        let ids: Vec<String> = ["possession", "momentum"].iter().map(|s| s.to_string()).collect();
        let config = ExecutionConfig::default();
        let base = scoped_key(&key, &ids, &config);

        assert_eq!(base, scoped_key(&key, &ids, &config));
        assert_ne!(base, key);

        let fewer = vec!["possession".to_string()];
        assert_ne!(base, scoped_key(&key, &fewer, &config));

        let reordered: Vec<String> = ids.iter().rev().cloned().collect();
        assert_ne!(base, scoped_key(&key, &reordered, &config));

        let stricter = ExecutionConfig {
            min_player_actions: config.min_player_actions + 5,
            ..config.clone()
        };
        assert_ne!(base, scoped_key(&key, &ids, &stricter));

        let wider = ExecutionConfig {
            workers: config.workers + 4,
            ..config.clone()
        };
        assert_eq!(base, scoped_key(&key, &ids, &wider));
    }

    #[test]
    fn test_missing_phases_differs_from_empty_identifier_only() {
        let with_phases = dataset(&[1], None);
        let without = Dataset::new(table(&[1]), None, None);
        assert_ne!(fingerprint(&with_phases, false), fingerprint(&without, false));
    }
}
