//! In-memory table: ordered column labels plus rows of typed cells.
//!
//! A `Table` is immutable once loaded. Column ordinals are 0-based and stable
//! for the lifetime of one load; label lookup always returns the first
//! occurrence of a duplicated label.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Raw field values that read as missing, in addition to the empty string.
const NA_TOKENS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A", "None"];

/// A single cell value.
///
/// Cells are totally ordered: numbers ascending, then text lexicographically,
/// then `Missing` last.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Build a numeric cell. Non-finite values become `Missing` and `-0.0`
    /// is folded into `0.0`.
    pub fn number(value: f64) -> Self {
        if !value.is_finite() {
            Cell::Missing
        } else if value == 0.0 {
            Cell::Number(0.0)
        } else {
            Cell::Number(value)
        }
    }

    /// Parse a raw CSV field.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
            return Cell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::number(v),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    /// Numeric value, if this is a number cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Number(_) => 0,
            Cell::Text(_) => 1,
            Cell::Missing => 2,
        }
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Number(a), Cell::Number(b)) => a.total_cmp(b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Cell::Number(v) => v.to_bits().hash(state),
            Cell::Text(s) => s.hash(state),
            Cell::Missing => {}
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Structural problems detected while assembling a table.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("row {row} has {len} fields but the header has {width}")]
    RowTooLong { row: usize, len: usize, width: usize },
}

/// An ordered sequence of rows sharing one header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Assemble a table. Short rows are padded with `Missing`; rows wider
    /// than the header are rejected.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        let width = columns.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(TableError::RowTooLong {
                    row: i,
                    len: row.len(),
                    width,
                });
            }
            row.resize(width, Cell::Missing);
            padded.push(row);
        }
        Ok(Self {
            columns,
            rows: padded,
        })
    }

    /// Column labels in ordinal order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Ordinal of the first column with exactly this label.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(|r| r.as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |r| r.get(column))
    }

    /// Same rows under new labels. Label count must match the column count.
    pub(crate) fn relabel(&self, columns: Vec<String>) -> Self {
        debug_assert_eq!(columns.len(), self.columns.len());
        Self {
            columns,
            rows: self.rows.clone(),
        }
    }

    /// BLAKE3 hash over labels and cells, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for label in &self.columns {
            hasher.update(label.as_bytes());
            hasher.update(&[0x1f]);
        }
        hasher.update(&[0x1e]);
        for row in &self.rows {
            for cell in row {
                match cell {
                    Cell::Number(v) => {
                        hasher.update(&[b'n']);
                        hasher.update(&v.to_bits().to_le_bytes());
                    }
                    Cell::Text(s) => {
                        hasher.update(&[b't']);
                        hasher.update(s.as_bytes());
                    }
                    Cell::Missing => {
                        hasher.update(&[b'm']);
                    }
                }
                hasher.update(&[0x1f]);
            }
            hasher.update(&[0x1e]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_classifies_fields() {
        assert_eq!(Cell::parse(" 2024 "), Cell::Number(2024.0));
        assert_eq!(Cell::parse("1.5"), Cell::Number(1.5));
        assert_eq!(Cell::parse("Consorcio"), Cell::Text("Consorcio".into()));
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("  "), Cell::Missing);
        assert_eq!(Cell::parse("N/A"), Cell::Missing);
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse("inf"), Cell::Text("inf".into()));
    }

    #[test]
    fn negative_zero_folds_into_zero() {
        assert_eq!(Cell::parse("-0"), Cell::Number(0.0));
        assert_eq!(Cell::number(-0.0), Cell::number(0.0));
    }

    #[test]
    fn cells_order_numbers_then_text_then_missing() {
        let mut cells = vec![
            Cell::Missing,
            Cell::from("B"),
            Cell::from(10.0),
            Cell::from("A"),
            Cell::from(2.0),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                Cell::from(2.0),
                Cell::from(10.0),
                Cell::from("A"),
                Cell::from("B"),
                Cell::Missing,
            ]
        );
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(Cell::from(2024.0).to_string(), "2024");
        assert_eq!(Cell::from(1.25).to_string(), "1.25");
        assert_eq!(Cell::Missing.to_string(), "");
    }

    #[test]
    fn short_rows_are_padded() {
        let table = Table::from_rows(
            labels(&["a", "b", "c"]),
            vec![vec![Cell::from(1.0)]],
        )
        .unwrap();
        assert_eq!(table.row(0).unwrap().len(), 3);
        assert_eq!(table.cell(0, 2), Some(&Cell::Missing));
    }

    #[test]
    fn long_rows_are_rejected() {
        let err = Table::from_rows(
            labels(&["a"]),
            vec![vec![Cell::from(1.0), Cell::from(2.0)]],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TableError::RowTooLong {
                row: 0,
                len: 2,
                width: 1
            }
        );
    }

    #[test]
    fn duplicate_labels_resolve_to_first() {
        let table = Table::from_rows(labels(&["x", "dup", "dup"]), vec![]).unwrap();
        assert_eq!(table.column_index("dup"), Some(1));
        assert_eq!(table.column_index("missing"), None);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Table::from_rows(labels(&["a"]), vec![vec![Cell::from(1.0)]]).unwrap();
        let b = Table::from_rows(labels(&["a"]), vec![vec![Cell::from(2.0)]]).unwrap();
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn cells_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            Cell::from(1.5),
            Cell::from("A"),
            Cell::Missing,
        ])
        .unwrap();
        assert_eq!(json, r#"[1.5,"A",null]"#);
    }
}
