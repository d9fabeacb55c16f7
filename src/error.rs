//! Structured error types for gridfeed.
//!
//! Only source acquisition and contract violations surface as errors;
//! per-field formatting anomalies never do (they become sentinel cells).

/// All errors that can occur while generating rows.
#[derive(Debug, thiserror::Error)]
pub enum GridFeedError {
    /// The record source could not deliver data.
    #[error("record source: {0}")]
    Source(String),

    /// JSON parsing error for the source wire format.
    #[error("JSON parsing: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The projector emitted a cell count different from the schema width.
    /// Indicates schema and projector have drifted out of sync.
    #[error("schema mismatch: row {row} produced {got} cells, schema declares {expected}")]
    SchemaMismatch {
        /// Row index being projected when the drift was detected.
        row: u64,
        /// Column count declared by the schema.
        expected: u64,
        /// Cell count the projector actually produced.
        got: u64,
    },

    /// A generation run was started while another run on the same
    /// generator had not finished.
    #[error("a generation run is already in flight")]
    RunInFlight,

    /// The run's cancellation token was triggered at a yield boundary.
    #[error("generation run cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridFeedError>;

impl From<String> for GridFeedError {
    fn from(s: String) -> Self {
        Self::Source(s)
    }
}

impl From<&str> for GridFeedError {
    fn from(s: &str) -> Self {
        Self::Source(s.to_string())
    }
}
