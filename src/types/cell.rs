use serde::{Deserialize, Serialize};

/// Flat cell identifier: `row * width + col`.
///
/// A bijection over `[0, N*W)` for `N` rows and `W` columns; the
/// virtualization layer addresses cells by this id, so it must be stable
/// and collision-free for the whole dataset lifetime.
pub type CellId = u64;

/// A cell's display value: rounded integer magnitude or formatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Rounded monetary magnitude (currency rule).
    Number(i64),
    /// Formatted display text (percentage, ratio, passthrough text, sentinel).
    Text(String),
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// The smallest addressable unit of display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Flat identifier (see [`CellId`]).
    pub id: CellId,
    /// Display value.
    pub v: CellValue,
}

/// One grid row: the source record's index plus its full ordered cell
/// sequence (exactly one cell per schema column, ascending column order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Index of the source record this row was projected from.
    pub id: u64,
    /// Ordered cells, one per column.
    pub cells: Vec<Cell>,
}

/// The ordered row collection assembled during one generation run.
///
/// Grows monotonically (rows appended at increasing indices, never removed
/// or reordered) until the run completes or is superseded.
pub type Rows = Vec<Row>;
