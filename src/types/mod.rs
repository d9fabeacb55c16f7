//! Core data model: cells, rows, and the normalized record shape.

mod cell;
mod record;

pub use cell::{Cell, CellId, CellValue, Row, Rows};
pub use record::{
    CapitalStructure, Growth10Yr, Margins, Returns, ShareholderReturns, StockRecord, Valuation,
};
