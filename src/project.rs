//! Cell projector: one normalized record in, one full ordered row out.
//!
//! Projection is a pure function of `(row index, record, schema)`. Column
//! order is fixed: identification, valuation, current margins, median
//! margins, returns, capital structure, decade growth, shareholder returns.
//! Cell ids follow the flat bijection `row * W + col`.

use crate::error::{GridFeedError, Result};
use crate::numfmt::{self, PERCENTAGE_DECIMALS, RATIO_DECIMALS};
use crate::schema::ColumnSchema;
use crate::types::{Cell, CellValue, Row, StockRecord};

/// Appends cells with ascending column indices and bijective flat ids.
struct RowBuilder {
    row: u64,
    width: u64,
    col: u64,
    cells: Vec<Cell>,
}

impl RowBuilder {
    fn new(row: u64, width: u64) -> Self {
        Self {
            row,
            width,
            col: 0,
            cells: Vec::with_capacity(usize::try_from(width).unwrap_or(0)),
        }
    }

    fn push(&mut self, v: CellValue) {
        self.cells.push(Cell {
            id: self.row * self.width + self.col,
            v,
        });
        self.col += 1;
    }

    fn pct(&mut self, value: f64) {
        self.push(CellValue::Text(numfmt::percentage(
            value,
            PERCENTAGE_DECIMALS,
        )));
    }

    fn ratio(&mut self, value: f64) {
        self.push(CellValue::Text(numfmt::ratio(value, RATIO_DECIMALS)));
    }

    fn finish(self) -> Result<Row> {
        if self.col != self.width {
            return Err(GridFeedError::SchemaMismatch {
                row: self.row,
                expected: self.width,
                got: self.col,
            });
        }
        Ok(Row {
            id: self.row,
            cells: self.cells,
        })
    }
}

/// Project one normalized record at `row_idx` into its full cell sequence.
///
/// # Errors
/// Returns [`GridFeedError::SchemaMismatch`] if the emitted cell count
/// differs from the schema width. That is a contract violation between
/// schema and projector, not a per-record condition, so it aborts the run.
pub fn project_row(row_idx: u64, record: &StockRecord, schema: &ColumnSchema) -> Result<Row> {
    let mut b = RowBuilder::new(row_idx, schema.width());

    // Identification
    b.push(numfmt::text(&record.ticker));
    b.push(numfmt::text(&record.company_name));
    b.push(numfmt::currency(record.market_cap));
    b.push(numfmt::currency(record.enterprise_value));

    // Valuation
    let v = &record.valuation;
    b.ratio(v.pe);
    b.ratio(v.pb);
    b.ratio(v.ps);
    b.ratio(v.ev_s);
    b.ratio(v.ev_fcf);

    // Margins, current then median
    let m = &record.margins;
    b.pct(m.gross_margin);
    b.pct(m.operating_margin);
    b.pct(m.fcf_margin);
    b.pct(m.gross_margin_median);
    b.pct(m.operating_margin_median);
    b.pct(m.fcf_margin_median);

    // Returns
    let r = &record.returns;
    b.pct(r.roic);
    b.pct(r.roa);
    b.pct(r.roe);
    b.pct(r.roce);
    b.pct(r.rotce);

    // Capital structure
    let c = &record.capital_structure;
    b.ratio(c.assets_to_equity);
    b.ratio(c.debt_to_equity);
    b.ratio(c.debt_to_assets);

    // Growth (10yr)
    let g = &record.growth_10yr;
    b.pct(g.revenue_growth);
    b.pct(g.asset_growth);
    b.pct(g.eps_growth);
    b.pct(g.fcf_growth);

    // Shareholder returns
    let s = &record.shareholder_returns;
    b.pct(s.dividend_payout_ratio);
    b.pct(s.buybacks);

    b.finish()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::source::RawRecord;
    use serde_json::json;

    fn sample_record() -> StockRecord {
        normalize(&RawRecord {
            key: "AAPL".to_string(),
            attrs: json!({
                "company_name": "Apple Inc.",
                "market_cap": 2999.6,
                "enterprise_value": 3100.2,
                "valuation": { "pe": 31.0, "pb": 45.0, "ps": 7.5, "ev_s": 7.8, "ev_fcf": 30.0 },
                "margins": {
                    "gross_margin": 0.44, "operating_margin": 0.3, "fcf_margin": 0.26,
                    "gross_margin_median": 0.41, "operating_margin_median": 0.29,
                    "fcf_margin_median": 0.25
                },
                "returns": {
                    "roic": 0.5, "roa": 0.28, "roe": 1.5, "roce": 0.55, "rotce": 1.6
                },
                "capital_structure": {
                    "assets_to_equity": 5.6, "debt_to_equity": 1.8, "debt_to_assets": 0.32
                },
                "growth_10yr": {
                    "revenue_growth": 0.08, "asset_growth": 0.05,
                    "eps_growth": 0.15, "fcf_growth": 0.12
                },
                "shareholder_returns": { "dividend_payout_ratio": 15.0, "buybacks": 0.03 }
            }),
        })
    }

    #[test]
    fn test_emits_full_width() {
        let schema = ColumnSchema::stock();
        let row = project_row(0, &sample_record(), &schema).unwrap();
        assert_eq!(row.cells.len() as u64, schema.width());
        assert_eq!(row.id, 0);
    }

    #[test]
    fn test_cell_ids_are_bijective() {
        let schema = ColumnSchema::stock();
        let w = schema.width();
        for row_idx in [0_u64, 1, 7, 10_000] {
            let row = project_row(row_idx, &sample_record(), &schema).unwrap();
            for (col, cell) in row.cells.iter().enumerate() {
                assert_eq!(cell.id, row_idx * w + col as u64);
            }
        }
    }

    #[test]
    fn test_fixed_column_order_and_formatting() {
        let schema = ColumnSchema::stock();
        let row = project_row(0, &sample_record(), &schema).unwrap();

        assert_eq!(row.cells[0].v, CellValue::Text("AAPL".to_string()));
        assert_eq!(row.cells[1].v, CellValue::Text("Apple Inc.".to_string()));
        assert_eq!(row.cells[2].v, CellValue::Number(3000));
        assert_eq!(row.cells[3].v, CellValue::Number(3100));
        assert_eq!(row.cells[4].v, CellValue::Text("31.00".to_string()));
        assert_eq!(row.cells[9].v, CellValue::Text("44.0%".to_string()));
        assert_eq!(row.cells[14].v, CellValue::Text("25.0%".to_string()));
        assert_eq!(row.cells[19].v, CellValue::Text("160.0%".to_string()));
        assert_eq!(row.cells[20].v, CellValue::Text("5.60".to_string()));
        assert_eq!(row.cells[26].v, CellValue::Text("12.0%".to_string()));
        // Payout ratio arrived as 15.0 percent units, normalized to 0.15.
        assert_eq!(row.cells[27].v, CellValue::Text("15.0%".to_string()));
        assert_eq!(row.cells[28].v, CellValue::Text("3.0%".to_string()));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let schema = ColumnSchema::stock();
        let record = sample_record();
        let a = project_row(42, &record, &schema).unwrap();
        let b = project_row(42, &record, &schema).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_schema_drift_is_fatal() {
        let schema = ColumnSchema::new(["only", "two"]);
        let err = project_row(0, &sample_record(), &schema).unwrap_err();
        match err {
            GridFeedError::SchemaMismatch { row, expected, got } => {
                assert_eq!(row, 0);
                assert_eq!(expected, 2);
                assert_eq!(got, 29);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
