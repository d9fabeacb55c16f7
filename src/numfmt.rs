//! Formatting rules applied by the record normalizer and the projector.
//!
//! Four rules cover every column of the stock schema:
//! - `percentage`: multiply by 100, fixed decimals, `%` marker
//! - `ratio`: fixed decimals, no marker
//! - `currency`: round to nearest integer magnitude
//! - `text`: passthrough
//!
//! Non-finite input (the normalizer maps missing/non-numeric fields to NaN)
//! formats to a deterministic sentinel rather than failing, so a malformed
//! field surfaces inside its own cell and nowhere else.

use crate::types::CellValue;

/// Sentinel text for non-finite numeric input.
pub const NAN_SENTINEL: &str = "NaN";

/// Default decimal places for the percentage rule.
pub const PERCENTAGE_DECIMALS: usize = 1;

/// Default decimal places for the ratio rule.
pub const RATIO_DECIMALS: usize = 2;

/// Format a fraction as a fixed-decimal percentage, e.g. `0.235` → `"23.5%"`.
#[must_use]
pub fn percentage(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{:.decimals$}%", value * 100.0)
    } else {
        format!("{NAN_SENTINEL}%")
    }
}

/// Format a ratio with fixed decimals, e.g. `12.3456` → `"12.35"`.
#[must_use]
pub fn ratio(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        NAN_SENTINEL.to_string()
    }
}

/// Round a monetary magnitude to the nearest integer, halves toward
/// positive infinity (`-10.5` → `-10`).
///
/// Non-finite input falls back to the text sentinel since NaN has no
/// integer representation.
#[must_use]
pub fn currency(value: f64) -> CellValue {
    if value.is_finite() {
        #[allow(clippy::cast_possible_truncation)]
        CellValue::Number((value + 0.5).floor() as i64)
    } else {
        CellValue::Text(NAN_SENTINEL.to_string())
    }
}

/// Passthrough for text fields.
#[must_use]
pub fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
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
    use test_case::test_case;

    #[test_case(0.235, 1 => "23.5%")]
    #[test_case(0.235, 0 => "24%"; "zero decimals")]
    #[test_case(0.0, 1 => "0.0%")]
    #[test_case(-0.042, 1 => "-4.2%")]
    #[test_case(1.5, 1 => "150.0%"; "above one")]
    fn test_percentage(value: f64, decimals: usize) -> String {
        percentage(value, decimals)
    }

    #[test_case(12.3456, 2 => "12.35")]
    #[test_case(0.5, 2 => "0.50")]
    #[test_case(-3.0, 2 => "-3.00")]
    fn test_ratio(value: f64, decimals: usize) -> String {
        ratio(value, decimals)
    }

    #[test]
    fn test_currency_rounds() {
        assert_eq!(currency(1234.4), CellValue::Number(1234));
        assert_eq!(currency(1234.5), CellValue::Number(1235));
        assert_eq!(currency(-10.6), CellValue::Number(-11));
    }

    #[test]
    fn test_currency_rounds_negative_halves_up() {
        assert_eq!(currency(-10.5), CellValue::Number(-10));
        assert_eq!(currency(-0.5), CellValue::Number(0));
        assert_eq!(currency(10.5), CellValue::Number(11));
    }

    #[test]
    fn test_nan_sentinels() {
        assert_eq!(percentage(f64::NAN, 1), "NaN%");
        assert_eq!(ratio(f64::NAN, 2), "NaN");
        assert_eq!(currency(f64::NAN), CellValue::Text("NaN".to_string()));
        assert_eq!(percentage(f64::INFINITY, 1), "NaN%");
    }

    #[test]
    fn test_text_passthrough() {
        assert_eq!(text("AAPL"), CellValue::Text("AAPL".to_string()));
        assert_eq!(text(""), CellValue::Text(String::new()));
    }
}
