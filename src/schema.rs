//! Column schema: the ordered, fixed-width list of column labels.
//!
//! The schema assigns semantic meaning to column indices and defines the
//! width `W` used by the flat cell-id bijection. It performs no computation
//! beyond length and label lookup.

/// Column labels of the default stock schema, in projection order.
pub const STOCK_COLUMNS: [&str; 29] = [
    "Ticker",
    "Company Name",
    "Market Cap (M)",
    "Enterprise Value (M)",
    // Valuation
    "P/E",
    "P/B",
    "P/S",
    "EV/S",
    "EV/FCF",
    // Margins
    "Gross Margin",
    "Operating Margin",
    "FCF Margin",
    "Gross Margin (Median)",
    "Operating Margin (Median)",
    "FCF Margin (Median)",
    // Returns
    "ROIC",
    "ROA",
    "ROE",
    "ROCE",
    "ROTCE",
    // Capital Structure
    "Assets/Equity",
    "Debt/Equity",
    "Debt/Assets",
    // Growth (10yr)
    "Revenue Growth",
    "Asset Growth",
    "EPS Growth",
    "FCF Growth",
    // Shareholder Returns
    "Dividend Payout Ratio",
    "Buybacks",
];

/// An ordered, immutable list of column labels.
///
/// Label order is fixed at construction; the projector and the consuming
/// rendering surface agree on it at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    labels: Vec<String>,
    width: u64,
}

impl ColumnSchema {
    /// Build a schema from an ordered label list.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let width = labels.len() as u64;
        Self { labels, width }
    }

    /// The default 29-column stock schema.
    #[must_use]
    pub fn stock() -> Self {
        Self::new(STOCK_COLUMNS)
    }

    /// Total column count `W`.
    #[must_use]
    pub fn width(&self) -> u64 {
        self.width
    }

    /// All labels in column order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Label of one column, if the index is in range.
    #[must_use]
    pub fn label(&self, col: usize) -> Option<&str> {
        self.labels.get(col).map(String::as_str)
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::stock()
    }
}
