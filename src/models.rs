//! Core data structures for SAV conversion.
//!
//! Defines the in-memory table produced by the read phase, the per-file
//! conversion report, and the aggregate statistics kept by batch runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single cell value decoded from a SAV case.
///
/// SPSS knows only numeric and string variables; absent numerics are stored
/// as the system-missing value and surface here as `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// Check if the value is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Render the value as a CSV field. Missing cells become empty fields;
    /// integral numbers drop the trailing `.0`.
    pub fn to_field(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

/// Format a numeric cell without a spurious fractional part
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One output column, carrying the variable label from the dictionary
/// when the file had one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub label: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    pub fn with_label(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
        }
    }
}

/// The decoded in-memory table: ordered columns, ordered rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append a row. Rows shorter than the column list are padded with
    /// missing values so every row has the full width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        if row.len() < self.columns.len() {
            row.resize(self.columns.len(), Value::Missing);
        }
        self.rows.push(row);
    }

    /// Return a sanitized copy for the final write retry: every text cell
    /// has embedded NUL and byte-order-mark characters stripped. Numeric
    /// and missing cells are untouched, and `self` is never modified.
    pub fn sanitized_copy(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|value| match value {
                        Value::Text(s) => Value::Text(sanitize_text(s)),
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// Strip the two known problem sequences from a text value: embedded NUL
/// characters and stray byte-order marks.
pub fn sanitize_text(s: &str) -> String {
    s.chars().filter(|c| *c != '\0' && *c != '\u{feff}').collect()
}

/// Report for one successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    /// Source file that was converted
    pub source: PathBuf,
    /// Output file that was written
    pub output: PathBuf,
    /// Label of the read strategy that produced the table
    pub strategy: String,
    /// Label of the output encoding that persisted it
    pub output_encoding: String,
    /// True when the table only persisted after the sanitization retry
    pub sanitized: bool,
    /// Table dimensions
    pub rows: usize,
    pub columns: usize,
    /// When the conversion finished
    pub finished_at: DateTime<Utc>,
}

/// Aggregate statistics for a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    /// Subfolders visited
    pub folders_scanned: usize,
    /// Subfolders that held no source files
    pub folders_empty: usize,
    /// Files converted successfully
    pub files_converted: usize,
    /// Files for which every strategy failed
    pub files_failed: usize,
    /// Total rows written across all outputs
    pub total_rows: usize,
    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}

impl BatchStats {
    /// Files seen overall
    pub fn files_total(&self) -> usize {
        self.files_converted + self.files_failed
    }

    /// Merge the outcome of a single file into the counters
    pub fn record(&mut self, report: &crate::error::Result<ConversionReport>) {
        match report {
            Ok(r) => {
                self.files_converted += 1;
                self.total_rows += r.rows;
            }
            Err(_) => self.files_failed += 1,
        }
    }
}
