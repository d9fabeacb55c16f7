//! gridfeed - incremental record-to-cell pipeline for virtualized grids
//!
//! Transforms a batch of raw structured records into a flat, indexed cell
//! collection consumed by a virtualized tabular rendering surface:
//! - Deterministic flat cell addressing (`id = row * width + col`)
//! - Cooperative batch scheduling; the host thread is never held for long
//! - Partial-result publishing for progressive rendering
//! - Lenient normalization; malformed fields become sentinel cells
//!
//! # Usage
//!
//! ```no_run
//! use gridfeed::{
//!     BufferSink, CancelToken, ColumnSchema, Generator, JsonRecordSource, TimesliceYield,
//! };
//!
//! # async fn demo() -> gridfeed::Result<()> {
//! let source = JsonRecordSource::from_path("stocks.json")?;
//! let generator = Generator::new(ColumnSchema::stock());
//! let mut sink = BufferSink::new();
//!
//! let summary = generator
//!     .run(
//!         &source,
//!         &TimesliceYield::default(),
//!         &mut sink,
//!         &CancelToken::new(),
//!         || {},
//!     )
//!     .await?;
//! assert_eq!(summary.rows, sink.rows().len() as u64);
//! # Ok(())
//! # }
//! ```

// Pipeline modules
pub mod error;
pub mod generate;
pub mod normalize;
pub mod numfmt;
pub mod project;
pub mod schema;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod types;

pub use error::{GridFeedError, Result};
pub use generate::{CancelToken, GenerateConfig, GenerateSummary, Generator};
pub use schema::{ColumnSchema, STOCK_COLUMNS};
pub use scheduler::{EagerYield, NeverYield, Priority, TimesliceYield, YieldScheduler};
pub use sink::{BufferSink, RowSink};
pub use source::{JsonRecordSource, RawRecord, RecordSource};
pub use types::*;

/// Generate rows from a feed document in one uninterrupted pass.
///
/// Convenience wrapper over [`Generator::run`] with the stock schema, no
/// yielding, and a buffering sink; returns the final row collection.
///
/// # Errors
/// Returns an error if the document is malformed or projection drifts from
/// the schema.
pub async fn generate_from_json(document: &str) -> Result<Rows> {
    let source = JsonRecordSource::new(document);
    let generator = Generator::new(ColumnSchema::stock());
    let mut sink = BufferSink::new();
    generator
        .run(&source, &NeverYield, &mut sink, &CancelToken::new(), || {})
        .await?;
    Ok(sink.into_rows())
}

/// Get the library version
#[must_use]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
