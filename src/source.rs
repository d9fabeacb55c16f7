//! Record source contract and the JSON-backed source.
//!
//! The wire format is a single JSON object mapping primary key to a nested
//! attribute object,
//! `{"AAPL": {"company_name": …, "valuation": {…}, …}, …}`.
//! Entry order is preserved (serde_json `preserve_order`), so row indices
//! are deterministic for a given document.

use serde_json::Value;

use crate::error::{GridFeedError, Result};

/// One entry of the source mapping, not yet normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Primary key (ticker symbol).
    pub key: String,
    /// Nested attribute object as received; nothing about its shape is
    /// trusted until normalization.
    pub attrs: Value,
}

/// Asynchronous source of an ordered raw-record sequence.
///
/// Fetch failure is the one error that aborts a generation run before any
/// publish happens; it propagates unchanged to the run's invoker.
// Single-threaded cooperative model; futures need not be Send.
#[allow(async_fn_in_trait)]
pub trait RecordSource {
    /// Fetch the full ordered record sequence.
    ///
    /// # Errors
    /// Returns [`GridFeedError::Source`] (or a transport-specific variant)
    /// when the source cannot deliver data.
    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// In-memory JSON source holding one feed document.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    document: String,
}

impl JsonRecordSource {
    /// Wrap an already-loaded JSON document.
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    /// Load a feed document from disk.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be read.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self {
            document: std::fs::read_to_string(path)?,
        })
    }
}

impl RecordSource for JsonRecordSource {
    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        parse_records(&self.document)
    }
}

/// Parse a feed document into raw records, preserving entry order.
///
/// # Errors
/// Returns a JSON error for malformed documents and a source error when the
/// top level is not an object.
pub fn parse_records(document: &str) -> Result<Vec<RawRecord>> {
    let top: Value = serde_json::from_str(document)?;
    let Value::Object(entries) = top else {
        return Err(GridFeedError::Source(
            "feed document must be a JSON object keyed by ticker".to_string(),
        ));
    };
    Ok(entries
        .into_iter()
        .map(|(key, attrs)| RawRecord { key, attrs })
        .collect())
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

    #[test]
    fn test_parse_preserves_entry_order() {
        let records =
            parse_records(r#"{"ZZZ": {"market_cap": 1}, "AAA": {"market_cap": 2}}"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, "ZZZ");
        assert_eq!(records[1].key, "AAA");
    }

    #[test]
    fn test_malformed_document_rejects() {
        assert!(parse_records("{not json").is_err());
    }

    #[test]
    fn test_non_object_top_level_rejects() {
        let err = parse_records("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, GridFeedError::Source(_)));
    }

    #[tokio::test]
    async fn test_json_source_fetch() {
        let source = JsonRecordSource::new(r#"{"AAPL": {"company_name": "Apple"}}"#);
        let records = source.fetch().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "AAPL");
    }
}
