//! Helpers shared by the section implementations.

use crate::dataset::{Record, View};
use crate::types::{MetricMap, MetricValue};
use serde_json::Value;

/// Success marker in `pass_outcome`.
pub const SUCCESSFUL: &str = "successful";

/// Rows that carry a pass outcome.
pub fn is_pass(r: &Record) -> bool {
    r.get("pass_outcome").is_some()
}

pub fn is_successful_pass(r: &Record) -> bool {
    r.str("pass_outcome") == Some(SUCCESSFUL)
}

/// Share of rows whose pass outcome is successful, over every row.
pub fn success_share(view: &View<'_>) -> Option<f64> {
    if !view.has("pass_outcome") {
        return None;
    }
    view.share(is_successful_pass)
}

/// Shannon entropy (natural log) of a distribution given as shares.
pub fn entropy(shares: impl IntoIterator<Item = f64>) -> f64 {
    -shares
        .into_iter()
        .filter(|p| *p > 0.0)
        .map(|p| p * p.ln())
        .sum::<f64>()
}

/// Entropy of `column` normalised against `categories` outcomes and flipped,
/// so 1.0 means every action happened in one category.
pub fn spatial_consistency(view: &View<'_>, column: &str, categories: f64) -> f64 {
    let e = entropy(view.value_shares(column).into_values());
    if e > 0.0 {
        1.0 - e / categories.ln()
    } else {
        1.0
    }
}

/// JSON cell as a metric value (numbers keep their integer-ness).
pub fn metric_from_value(value: &Value) -> Option<MetricValue> {
    match value {
        Value::Bool(b) => Some(MetricValue::Bool(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(MetricValue::Int)
            .or_else(|| n.as_f64().map(MetricValue::Float)),
        Value::String(s) => Some(MetricValue::Text(s.clone())),
        _ => None,
    }
}

/// Player identity columns shared by every per-player row.
pub fn player_identity(player_id: &str, rows: &View<'_>) -> MetricMap {
    let mut m = MetricMap::new();
    let id = rows
        .rows()
        .find_map(|r| r.get("player_id"))
        .and_then(metric_from_value)
        .unwrap_or_else(|| MetricValue::Text(player_id.to_string()));
    m.insert("player_id", id);
    m.insert(
        "player_name",
        rows.first_str("player_name")
            .unwrap_or_else(|| format!("Player {}", player_id)),
    );
    m.insert(
        "position",
        rows.first_str("player_position")
            .unwrap_or_else(|| "Unknown".to_string()),
    );
    m
}

/// Sort rows by a numeric metric, highest first, and keep `n`.
///
/// Ties keep their incoming order, which is player-id order.
pub fn top_by(rows: &[MetricMap], metric: &str, n: usize) -> Vec<MetricMap> {
    let mut sorted: Vec<&MetricMap> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        let a = a.get(metric).and_then(MetricValue::as_f64).unwrap_or(f64::MIN);
        let b = b.get(metric).and_then(MetricValue::as_f64).unwrap_or(f64::MIN);
        b.total_cmp(&a)
    });
    sorted.into_iter().take(n).cloned().collect()
}

/// Entry with the highest share, ties broken by key order.
pub fn max_entry<'m>(
    map: impl IntoIterator<Item = (&'m String, &'m f64)>,
) -> Option<(&'m String, f64)> {
    map.into_iter()
        .fold(None, |best: Option<(&String, f64)>, (k, v)| match best {
            Some((_, b)) if b >= *v => best,
            _ => Some((k, *v)),
        })
}
