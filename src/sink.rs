//! Sink publisher contract: how generated rows reach the rendering surface.
//!
//! The surface owns its own windowing and virtualization; the pipeline only
//! hands it read-only snapshots of the row collection, one or more partial
//! snapshots followed by exactly one final snapshot per successful run.

use crate::types::{Row, Rows};

/// Row-ingestion contract of the rendering surface.
pub trait RowSink {
    /// Receive a snapshot of the row collection assembled so far.
    ///
    /// `partial` is true for progress snapshots; the final complete
    /// collection arrives exactly once with `partial == false`. Snapshots
    /// are strictly increasing prefixes of the final collection and must
    /// not be mutated by the sink.
    fn publish(&mut self, rows: &[Row], partial: bool);
}

/// Sink that buffers the latest snapshot and counts publishes.
///
/// Stands in for a real rendering surface in the CLI and in tests, and
/// gives callers an explicit handle to inspect instead of process-wide
/// state.
#[derive(Debug, Default)]
pub struct BufferSink {
    rows: Rows,
    partial_publishes: u64,
    final_publishes: u64,
}

impl BufferSink {
    /// Create an empty buffer sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of partial snapshots received.
    #[must_use]
    pub fn partial_publishes(&self) -> u64 {
        self.partial_publishes
    }

    /// Number of final snapshots received.
    #[must_use]
    pub fn final_publishes(&self) -> u64 {
        self.final_publishes
    }

    /// Consume the sink, returning the last snapshot.
    #[must_use]
    pub fn into_rows(self) -> Rows {
        self.rows
    }
}

impl RowSink for BufferSink {
    fn publish(&mut self, rows: &[Row], partial: bool) {
        self.rows = rows.to_vec();
        if partial {
            self.partial_publishes += 1;
        } else {
            self.final_publishes += 1;
        }
    }
}

impl<S: RowSink + ?Sized> RowSink for &mut S {
    fn publish(&mut self, rows: &[Row], partial: bool) {
        (**self).publish(rows, partial);
    }
}
