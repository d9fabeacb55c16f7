//! Record normalizer: loosely-typed source records in, fixed-shape
//! [`StockRecord`]s out.
//!
//! The source delivers arbitrarily-shaped JSON; nothing about a raw record
//! is trusted. Every numeric field goes through a lenient parse that maps
//! missing, null, or non-numeric input to NaN, and every text field falls
//! back to the empty string. Normalization therefore never fails for a
//! single malformed record; anomalies surface later as sentinel cells.

use serde_json::Value;

use crate::source::RawRecord;
use crate::types::{
    CapitalStructure, Growth10Yr, Margins, Returns, ShareholderReturns, StockRecord, Valuation,
};

/// Lenient numeric field access: JSON number → value, everything else → NaN.
fn num(attrs: &Value, field: &str) -> f64 {
    attrs
        .get(field)
        .and_then(Value::as_f64)
        .unwrap_or(f64::NAN)
}

/// Lenient nested numeric access: `attrs[group][field]`.
fn num_in(attrs: &Value, group: &str, field: &str) -> f64 {
    attrs
        .get(group)
        .map_or(f64::NAN, |inner| num(inner, field))
}

/// Lenient text field access: JSON string → owned copy, everything else → "".
fn text(attrs: &Value, field: &str) -> String {
    attrs
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Normalize one raw record into the fixed stock-record shape.
///
/// The record's primary key becomes `ticker`. `dividend_payout_ratio` is
/// converted from the source's percent units (0-100) to a fraction here, at
/// the parse boundary, so all percentage fields downstream share one unit
/// convention.
#[must_use]
pub fn normalize(raw: &RawRecord) -> StockRecord {
    let a = &raw.attrs;
    StockRecord {
        ticker: raw.key.clone(),
        company_name: text(a, "company_name"),
        market_cap: num(a, "market_cap"),
        enterprise_value: num(a, "enterprise_value"),
        valuation: Valuation {
            pe: num_in(a, "valuation", "pe"),
            pb: num_in(a, "valuation", "pb"),
            ps: num_in(a, "valuation", "ps"),
            ev_s: num_in(a, "valuation", "ev_s"),
            ev_fcf: num_in(a, "valuation", "ev_fcf"),
        },
        margins: Margins {
            gross_margin: num_in(a, "margins", "gross_margin"),
            operating_margin: num_in(a, "margins", "operating_margin"),
            fcf_margin: num_in(a, "margins", "fcf_margin"),
            gross_margin_median: num_in(a, "margins", "gross_margin_median"),
            operating_margin_median: num_in(a, "margins", "operating_margin_median"),
            fcf_margin_median: num_in(a, "margins", "fcf_margin_median"),
        },
        returns: Returns {
            roic: num_in(a, "returns", "roic"),
            roa: num_in(a, "returns", "roa"),
            roe: num_in(a, "returns", "roe"),
            roce: num_in(a, "returns", "roce"),
            rotce: num_in(a, "returns", "rotce"),
        },
        capital_structure: CapitalStructure {
            assets_to_equity: num_in(a, "capital_structure", "assets_to_equity"),
            debt_to_equity: num_in(a, "capital_structure", "debt_to_equity"),
            debt_to_assets: num_in(a, "capital_structure", "debt_to_assets"),
        },
        growth_10yr: Growth10Yr {
            revenue_growth: num_in(a, "growth_10yr", "revenue_growth"),
            asset_growth: num_in(a, "growth_10yr", "asset_growth"),
            eps_growth: num_in(a, "growth_10yr", "eps_growth"),
            fcf_growth: num_in(a, "growth_10yr", "fcf_growth"),
        },
        shareholder_returns: ShareholderReturns {
            // Percent units in the source; fraction everywhere else.
            dividend_payout_ratio: num_in(a, "shareholder_returns", "dividend_payout_ratio")
                / 100.0,
            buybacks: num_in(a, "shareholder_returns", "buybacks"),
        },
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(attrs: Value) -> RawRecord {
        RawRecord {
            key: "TEST".to_string(),
            attrs,
        }
    }

    #[test]
    fn test_full_record() {
        let record = normalize(&raw(json!({
            "company_name": "Test Corp",
            "market_cap": 1234.5,
            "enterprise_value": 2000.0,
            "valuation": { "pe": 15.0, "pb": 2.0, "ps": 3.0, "ev_s": 4.0, "ev_fcf": 20.0 },
            "margins": {
                "gross_margin": 0.4, "operating_margin": 0.2, "fcf_margin": 0.15,
                "gross_margin_median": 0.38, "operating_margin_median": 0.19,
                "fcf_margin_median": 0.14
            },
            "returns": { "roic": 0.12, "roa": 0.08, "roe": 0.2, "roce": 0.15, "rotce": 0.25 },
            "capital_structure": {
                "assets_to_equity": 2.5, "debt_to_equity": 1.1, "debt_to_assets": 0.4
            },
            "growth_10yr": {
                "revenue_growth": 0.07, "asset_growth": 0.05,
                "eps_growth": 0.1, "fcf_growth": 0.09
            },
            "shareholder_returns": { "dividend_payout_ratio": 35.0, "buybacks": 0.02 }
        })));

        assert_eq!(record.ticker, "TEST");
        assert_eq!(record.company_name, "Test Corp");
        assert_eq!(record.market_cap, 1234.5);
        assert_eq!(record.valuation.pe, 15.0);
        assert_eq!(record.margins.fcf_margin_median, 0.14);
        assert_eq!(record.returns.rotce, 0.25);
        assert_eq!(record.growth_10yr.fcf_growth, 0.09);
        assert_eq!(record.shareholder_returns.buybacks, 0.02);
    }

    #[test]
    fn test_payout_ratio_converted_to_fraction() {
        let record = normalize(&raw(json!({
            "shareholder_returns": { "dividend_payout_ratio": 35.0, "buybacks": 0.02 }
        })));
        assert_eq!(record.shareholder_returns.dividend_payout_ratio, 0.35);
    }

    #[test]
    fn test_missing_numeric_field_is_nan() {
        let record = normalize(&raw(json!({
            "margins": { "operating_margin": 0.2 }
        })));
        assert!(record.margins.gross_margin.is_nan());
        assert_eq!(record.margins.operating_margin, 0.2);
        assert!(record.valuation.pe.is_nan());
    }

    #[test]
    fn test_non_numeric_field_is_nan() {
        let record = normalize(&raw(json!({
            "market_cap": "not a number",
            "valuation": { "pe": null }
        })));
        assert!(record.market_cap.is_nan());
        assert!(record.valuation.pe.is_nan());
    }

    #[test]
    fn test_missing_text_field_is_empty() {
        let record = normalize(&raw(json!({})));
        assert_eq!(record.company_name, "");
        assert_eq!(record.ticker, "TEST");
    }

    #[test]
    fn test_wrong_shape_group_is_all_nan() {
        let record = normalize(&raw(json!({ "returns": [1, 2, 3] })));
        assert!(record.returns.roic.is_nan());
        assert!(record.returns.rotce.is_nan());
    }
}
