//! Row views and the aggregations sections are built from.
//!
//! All aggregations skip absent values. Rates return `None` on an empty view
//! so callers can omit the metric instead of emitting a NaN.

use super::{Record, Table};
use std::collections::{BTreeMap, BTreeSet};

/// Borrowed subset of a table's rows.
///
/// Column presence is answered by the parent table, so a filtered view still
/// knows which optional fields the dataset carries.
#[derive(Debug, Clone)]
pub struct View<'a> {
    table: &'a Table,
    rows: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub(crate) fn new(table: &'a Table, rows: Vec<&'a Record>) -> Self {
        Self { table, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has(&self, column: &str) -> bool {
        self.table.has(column)
    }

    pub fn has_all(&self, columns: &[&str]) -> bool {
        self.table.has_all(columns)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.rows.iter().copied()
    }

    #[must_use]
    pub fn filter(&self, pred: impl Fn(&Record) -> bool) -> Self {
        Self {
            table: self.table,
            rows: self.rows.iter().copied().filter(|r| pred(r)).collect(),
        }
    }

    /// Rows whose string column equals `value`.
    #[must_use]
    pub fn where_eq(&self, column: &str, value: &str) -> Self {
        self.filter(|r| r.str(column) == Some(value))
    }

    /// Rows whose flag column is set.
    #[must_use]
    pub fn where_set(&self, column: &str) -> Self {
        self.filter(|r| r.is_set(column))
    }

    // ------------------------------------------------------------------------
    // Numeric
    // ------------------------------------------------------------------------

    fn values(&self, column: &str) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.f64(column)).collect()
    }

    /// Mean of present values.
    pub fn mean(&self, column: &str) -> Option<f64> {
        mean(&self.values(column))
    }

    /// Sum of present values (0 when none).
    pub fn sum(&self, column: &str) -> f64 {
        self.values(column).iter().sum()
    }

    /// Sample standard deviation (n-1). Needs at least two values.
    pub fn std(&self, column: &str) -> Option<f64> {
        std_dev(&self.values(column))
    }

    // ------------------------------------------------------------------------
    // Counting and rates
    // ------------------------------------------------------------------------

    pub fn count(&self, pred: impl Fn(&Record) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(r)).count()
    }

    /// Share of all rows matching `pred`; `None` on an empty view.
    pub fn share(&self, pred: impl Fn(&Record) -> bool) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        Some(self.count(pred) as f64 / self.rows.len() as f64)
    }

    /// Share of all rows whose string column equals `value`.
    pub fn eq_share(&self, column: &str, value: &str) -> Option<f64> {
        self.share(|r| r.str(column) == Some(value))
    }

    /// Share of all rows whose flag is set (absent counts as unset).
    pub fn set_share(&self, column: &str) -> Option<f64> {
        self.share(|r| r.is_set(column))
    }

    /// Mean of the flag over rows where it is present.
    pub fn flag_mean(&self, column: &str) -> Option<f64> {
        let flags: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|r| r.flag(column))
            .map(|b| if b { 1.0 } else { 0.0 })
            .collect();
        mean(&flags)
    }

    pub fn set_count(&self, column: &str) -> usize {
        self.count(|r| r.is_set(column))
    }

    // ------------------------------------------------------------------------
    // Categorical
    // ------------------------------------------------------------------------

    /// Occurrences of each key in `column`.
    pub fn value_counts(&self, column: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for key in self.rows.iter().filter_map(|r| r.key(column)) {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    /// Normalised occurrences of each key over rows where it is present.
    pub fn value_shares(&self, column: &str) -> BTreeMap<String, f64> {
        let counts = self.value_counts(column);
        let total: usize = counts.values().sum();
        counts
            .into_iter()
            .map(|(k, n)| (k, n as f64 / total as f64))
            .collect()
    }

    pub fn nunique(&self, column: &str) -> usize {
        self.rows
            .iter()
            .filter_map(|r| r.key(column))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Partition rows by the key in `column`. Rows without the key are dropped.
    pub fn group_by(&self, column: &str) -> BTreeMap<String, View<'a>> {
        let mut groups: BTreeMap<String, Vec<&'a Record>> = BTreeMap::new();
        for row in &self.rows {
            if let Some(key) = row.key(column) {
                groups.entry(key).or_default().push(*row);
            }
        }
        groups
            .into_iter()
            .map(|(k, rows)| (k, View::new(self.table, rows)))
            .collect()
    }

    /// First present string value in row order.
    pub fn first_str(&self, column: &str) -> Option<String> {
        self.rows.iter().find_map(|r| r.key(column))
    }
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Population standard deviation, for series of window aggregates.
pub(crate) fn pop_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn sample() -> Table {
        Table::from_records(vec![
            Record::new()
                .with("player_id", 1)
                .with("pass_outcome", "successful")
                .with("xthreat", 0.1)
                .with("carry", true),
            Record::new()
                .with("player_id", 1)
                .with("pass_outcome", "unsuccessful")
                .with("xthreat", 0.3),
            Record::new()
                .with("player_id", 2)
                .with("pass_outcome", "successful")
                .with("carry", false),
        ])
    }

    #[test]
    fn test_mean_and_sum_skip_absent() {
        let table = sample();
        let view = table.view();
        assert!((view.mean("xthreat").unwrap() - 0.2).abs() < 1e-12);
        assert!((view.sum("xthreat") - 0.4).abs() < 1e-12);
        assert_eq!(view.mean("missing"), None);
    }

    #[test]
    fn test_share_counts_absent_as_unset() {
        let table = sample();
        let view = table.view();
        // carry: true, absent, false -> 1/3 over all rows
        assert!((view.set_share("carry").unwrap() - 1.0 / 3.0).abs() < 1e-12);
        // flag mean only looks at present values -> 1/2
        assert!((view.flag_mean("carry").unwrap() - 0.5).abs() < 1e-12);
        assert!((view.eq_share("pass_outcome", "successful").unwrap() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_view_rates_are_none() {
        let table = sample();
        let empty = table.filter(|_| false);
        assert_eq!(empty.share(|_| true), None);
        assert_eq!(empty.mean("xthreat"), None);
        assert_eq!(empty.sum("xthreat"), 0.0);
    }

    #[test]
    fn test_group_by_and_value_counts() {
        let table = sample();
        let view = table.view();
        let groups = view.group_by("player_id");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["1"].len(), 2);
        assert_eq!(view.nunique("player_id"), 2);

        let shares = view.value_shares("pass_outcome");
        assert!((shares["successful"] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_needs_two_values() {
        assert_eq!(std_dev(&[1.0]), None);
        let s = std_dev(&[1.0, 3.0]).unwrap();
        assert!((s - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert_eq!(pop_std_dev(&[1.0, 3.0]), Some(1.0));
    }
}
