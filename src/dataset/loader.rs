//! Table ingestion from JSON documents.
//!
//! Two shapes are accepted:
//! - records orientation: `[{"col": v, ...}, ...]`
//! - columns orientation: `{"col": [v, v, ...], ...}` with equal-length arrays
//!
//! JSONL (one record object per line) is also supported. Anything else is a
//! fatal [`DatasetError::NotTabular`].

use super::{DatasetError, Record, Table};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

impl Table {
    /// Build a table from an already-parsed JSON document.
    pub fn from_json_value(value: Value, table: &str) -> Result<Self, DatasetError> {
        match value {
            Value::Array(items) => {
                let mut rows = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(map) => rows.push(Record::from(map)),
                        other => {
                            return Err(DatasetError::NotTabular {
                                table: table.to_string(),
                                reason: format!(
                                    "row {index} is {} rather than an object",
                                    json_kind(&other)
                                ),
                            })
                        }
                    }
                }
                Ok(Self::from_records(rows))
            }
            Value::Object(columns) => Self::from_columns(columns, table),
            other => Err(DatasetError::NotTabular {
                table: table.to_string(),
                reason: format!("top-level value is {}", json_kind(&other)),
            }),
        }
    }

    fn from_columns(columns: Map<String, Value>, table: &str) -> Result<Self, DatasetError> {
        let mut names = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for (name, value) in columns {
            match value {
                Value::Array(values) => {
                    names.push(name);
                    arrays.push(values);
                }
                other => {
                    return Err(DatasetError::NotTabular {
                        table: table.to_string(),
                        reason: format!("column `{name}` is {} rather than an array", json_kind(&other)),
                    })
                }
            }
        }

        let expected = arrays.first().map_or(0, Vec::len);
        for (name, values) in names.iter().zip(&arrays) {
            if values.len() != expected {
                return Err(DatasetError::RaggedColumn {
                    table: table.to_string(),
                    column: name.clone(),
                    expected,
                    found: values.len(),
                });
            }
        }

        let mut rows: Vec<Record> = (0..expected).map(|_| Record::new()).collect();
        for (name, values) in names.iter().zip(arrays) {
            for (row, value) in rows.iter_mut().zip(values) {
                row.insert(name, value);
            }
        }
        Ok(Self::new(names, rows))
    }

    /// Parse a JSON document (records or columns orientation).
    pub fn from_json_str(text: &str, table: &str) -> Result<Self, DatasetError> {
        let value: Value = serde_json::from_str(text).map_err(|source| DatasetError::Json {
            table: table.to_string(),
            source,
        })?;
        Self::from_json_value(value, table)
    }

    /// Parse JSONL: one record object per non-blank line.
    pub fn from_jsonl_str(text: &str, table: &str) -> Result<Self, DatasetError> {
        let mut items = Vec::new();
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let value: Value = serde_json::from_str(line).map_err(|source| DatasetError::Json {
                table: table.to_string(),
                source,
            })?;
            items.push(value);
        }
        Self::from_json_value(Value::Array(items), table)
    }

    /// Load a table from disk. `.jsonl` files are read line by line, anything
    /// else as a single JSON document.
    pub fn load(path: &Path, table: &str) -> Result<Self, DatasetError> {
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let loaded = if path.extension().is_some_and(|ext| ext == "jsonl") {
            Self::from_jsonl_str(&text, table)?
        } else {
            Self::from_json_str(&text, table)?
        };
        debug!(
            path = %path.display(),
            table = table,
            rows = loaded.len(),
            columns = loaded.columns().len(),
            "Loaded table"
        );
        Ok(loaded)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
