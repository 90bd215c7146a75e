//! Match Dataset - read-only tabular view over event and phase records
//!
//! The engine works on two schema-flexible tables produced by the ingestion
//! layer:
//!
//! - **events**: one record per discrete match action (player, phase index,
//!   period/minute, pitch zone, tactical flags such as `lead_to_shot`)
//! - **phases**: one record per possession phase (duration, type, outcome).
//!   Optional - sections fall back to event-level data when it is absent.
//!
//! Columns vary by availability. Sections never index a column blindly; they
//! use the typed accessors on [`Record`] which return `None` for an absent or
//! null field, and check [`Table::has`] before producing a column-dependent
//! metric.

mod aggregate;
mod loader;

pub use aggregate::View;
pub(crate) use aggregate::{mean, pop_std_dev, std_dev};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Fatal input errors - the tables themselves are unusable.
///
/// These are the only failures `MetricsEngine::compute_all` propagates; an
/// individual section failing is recorded inside the bundle instead.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Input is not a records array or a columns object
    #[error("{table} table is not tabular: {reason}")]
    NotTabular { table: String, reason: String },

    /// A row holds a field the table schema does not declare
    #[error("{table} table row {row} holds undeclared column `{column}`")]
    UndeclaredColumn {
        table: String,
        row: usize,
        column: String,
    },

    /// The schema lists the same column twice
    #[error("{table} table declares column `{column}` more than once")]
    DuplicateColumn { table: String, column: String },

    /// Columns-orientation input with arrays of different lengths
    #[error("{table} table column `{column}` has {found} values, expected {expected}")]
    RaggedColumn {
        table: String,
        column: String,
        expected: usize,
        found: usize,
    },

    /// Input file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input text is not valid JSON
    #[error("failed to parse {table} table: {source}")]
    Json {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// Record
// ============================================================================

/// One row of a table. Field access is always optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, mostly for fixtures.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Value>) {
        self.0.insert(column.to_string(), value.into());
    }

    /// Raw value; JSON null counts as absent.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column).filter(|v| !v.is_null())
    }

    /// Numeric value. Booleans map to 0/1 and numeric strings are parsed.
    /// Non-finite results are treated as absent.
    pub fn f64(&self, column: &str) -> Option<f64> {
        let value = match self.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }

    /// Integer value (floats with no fractional part are accepted).
    pub fn i64(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String value. Only JSON strings qualify.
    pub fn str(&self, column: &str) -> Option<&str> {
        self.get(column)?.as_str()
    }

    /// Boolean flag. Accepts bools, numbers (non-zero is true) and the usual
    /// textual spellings.
    pub fn flag(&self, column: &str) -> Option<bool> {
        match self.get(column)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// `true` only when the flag is present and set.
    pub fn is_set(&self, column: &str) -> bool {
        self.flag(column) == Some(true)
    }

    /// Stringified value used as a grouping key.
    pub fn key(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub(crate) fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Immutable, schema-flexible table.
///
/// The column set is table-level: a column is "present" when the schema
/// declares it, even if individual rows hold null for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    /// Build a table with an explicit schema. Call [`Table::validate`] before
    /// trusting it.
    pub fn new(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    /// Build a table whose schema is the union of row keys, in first-seen order.
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for row in &rows {
            for column in row.columns() {
                if seen.insert(column.clone()) {
                    columns.push(column.clone());
                }
            }
        }
        Self { columns, rows }
    }

    /// Check the schema is coherent: no duplicate columns and every row field
    /// is declared.
    pub fn validate(&self, table: &str) -> Result<(), DatasetError> {
        let mut declared = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !declared.insert(column.as_str()) {
                return Err(DatasetError::DuplicateColumn {
                    table: table.to_string(),
                    column: column.clone(),
                });
            }
        }
        for (index, row) in self.rows.iter().enumerate() {
            if let Some(column) = row.columns().find(|c| !declared.contains(c.as_str())) {
                return Err(DatasetError::UndeclaredColumn {
                    table: table.to_string(),
                    row: index,
                    column: column.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn has_all(&self, columns: &[&str]) -> bool {
        columns.iter().all(|c| self.has(c))
    }

    /// Borrowed view over every row.
    pub fn view(&self) -> View<'_> {
        View::new(self, self.rows.iter().collect())
    }

    /// Borrowed view over the rows matching `pred`.
    pub fn filter(&self, pred: impl Fn(&Record) -> bool) -> View<'_> {
        self.view().filter(pred)
    }

    /// Copy of this table with one derived column added (or replaced).
    ///
    /// Sections that need windowing or derived state augment a private copy;
    /// the shared snapshot is never touched.
    #[must_use]
    pub fn with_column(&self, column: &str, derive: impl Fn(&Record) -> Option<Value>) -> Self {
        let mut copy = self.clone();
        if !copy.has(column) {
            copy.columns.push(column.to_string());
        }
        for row in &mut copy.rows {
            match derive(row) {
                Some(value) => row.insert(column, value),
                None => row.insert(column, Value::Null),
            }
        }
        copy
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Shared, read-only input for one engine run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    events: Table,
    phases: Option<Table>,
    identifier: Option<String>,
}

impl Dataset {
    pub fn new(events: Table, phases: Option<Table>, identifier: Option<String>) -> Self {
        Self {
            events,
            phases,
            identifier,
        }
    }

    pub fn events(&self) -> &Table {
        &self.events
    }

    pub fn phases(&self) -> Option<&Table> {
        self.phases.as_ref()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn total_events(&self) -> usize {
        self.events.len()
    }

    pub fn total_phases(&self) -> usize {
        self.phases.as_ref().map_or(0, Table::len)
    }

    /// Validate both tables. Failure here is fatal for the whole run.
    pub fn validate(&self) -> Result<(), DatasetError> {
        self.events.validate("events")?;
        if let Some(phases) = &self.phases {
            phases.validate("phases")?;
        }
        Ok(())
    }
}
