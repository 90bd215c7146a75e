//! Nested metric values produced by analytic sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single metric value: scalar, list, or nested group.
///
/// Serialized untagged so bundles read as plain JSON trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<MetricValue>),
    Map(MetricMap),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MetricMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetricValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Non-finite floats have no JSON representation.
    fn is_representable(&self) -> bool {
        !matches!(self, Self::Float(f) if !f.is_finite())
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<MetricMap> for MetricValue {
    fn from(v: MetricMap) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<MetricValue>> From<Vec<T>> for MetricValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<MetricValue>> From<BTreeMap<String, T>> for MetricValue {
    fn from(v: BTreeMap<String, T>) -> Self {
        let mut map = MetricMap::new();
        for (k, value) in v {
            map.insert(k, value);
        }
        Self::Map(map)
    }
}

/// Ordered metric group: name -> value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricMap(BTreeMap<String, MetricValue>);

impl MetricMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a metric. Non-finite floats are dropped.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetricValue>) {
        let value = value.into();
        if value.is_representable() {
            self.0.insert(key.into(), value);
        }
    }

    /// Insert only when a value was derivable.
    pub fn insert_opt<V: Into<MetricValue>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(v) = value {
            self.insert(key, v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.0.get(key)
    }

    /// Nested group lookup.
    pub fn group(&self, key: &str) -> Option<&MetricMap> {
        self.get(key).and_then(MetricValue::as_map)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge another group in, overwriting on key clash.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }
}

/// Output of one analytic section: fixed label plus metric groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMetrics {
    /// Human-readable section label (e.g. "Set-Pieces")
    pub section: String,
    /// Metric group name -> group contents
    pub metrics: MetricMap,
}

impl SectionMetrics {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            metrics: MetricMap::new(),
        }
    }

    /// Builder-style group insert.
    #[must_use]
    pub fn with_group(mut self, name: &str, value: impl Into<MetricValue>) -> Self {
        self.metrics.insert(name, value);
        self
    }

    pub fn group(&self, name: &str) -> Option<&MetricMap> {
        self.metrics.group(name)
    }
}
