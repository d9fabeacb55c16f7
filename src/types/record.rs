use serde::{Deserialize, Serialize};

/// Valuation multiples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub pe: f64,
    pub pb: f64,
    pub ps: f64,
    pub ev_s: f64,
    pub ev_fcf: f64,
}

/// Profitability margins, current and ten-year medians. All fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub fcf_margin: f64,
    pub gross_margin_median: f64,
    pub operating_margin_median: f64,
    pub fcf_margin_median: f64,
}

/// Return-on-capital metrics. All fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Returns {
    pub roic: f64,
    pub roa: f64,
    pub roe: f64,
    pub roce: f64,
    pub rotce: f64,
}

/// Balance-sheet leverage ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub assets_to_equity: f64,
    pub debt_to_equity: f64,
    pub debt_to_assets: f64,
}

/// Ten-year compound growth rates. All fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct Growth10Yr {
    pub revenue_growth: f64,
    pub asset_growth: f64,
    pub eps_growth: f64,
    pub fcf_growth: f64,
}

/// Shareholder-return metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareholderReturns {
    /// Stored as a fraction. Sources report this field in percent units
    /// (0-100); the normalizer converts at the parse boundary so every
    /// percentage field downstream shares one unit convention.
    pub dividend_payout_ratio: f64,
    /// Buyback yield as a fraction.
    pub buybacks: f64,
}

/// A fully normalized stock record.
///
/// Immutable once constructed. Numeric fields may hold `f64::NAN` when the
/// raw input was missing or non-numeric; formatting renders those as the
/// sentinel instead of failing, so one malformed record never poisons a
/// batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Primary key from the source mapping.
    pub ticker: String,
    pub company_name: String,
    /// Market capitalization, millions.
    pub market_cap: f64,
    /// Enterprise value, millions.
    pub enterprise_value: f64,
    pub valuation: Valuation,
    pub margins: Margins,
    pub returns: Returns,
    pub capital_structure: CapitalStructure,
    pub growth_10yr: Growth10Yr,
    pub shareholder_returns: ShareholderReturns,
}
