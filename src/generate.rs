//! Cooperative batch generator: drives the full raw-records → rows
//! transformation without monopolizing the host thread.
//!
//! One run: fetch records, then iterate row indices in ascending order,
//! normalizing and projecting each record. At every batch boundary the
//! injected [`YieldScheduler`] is consulted; if the host wants the thread
//! back, the accumulated rows are published as a partial snapshot before
//! the task suspends. After the last row, the complete collection is
//! published exactly once as final and the completion callback fires.

use std::cell::Cell as StdCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{GridFeedError, Result};
use crate::normalize::normalize;
use crate::project::project_row;
use crate::schema::ColumnSchema;
use crate::scheduler::{Priority, YieldScheduler};
use crate::sink::RowSink;
use crate::source::RecordSource;
use crate::types::Rows;

/// Tuning knobs for one generator.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Rows processed between yield checks.
    pub batch_size: usize,
    /// Priority class reported to the host scheduler.
    pub priority: Priority,
}

impl GenerateConfig {
    /// Default sizing: check the scheduler every 10,000 rows.
    pub const DEFAULT_BATCH_SIZE: usize = 10_000;
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            priority: Priority::Background,
        }
    }
}

/// Cooperative cancellation handle, honored at yield boundaries.
///
/// Cloning shares the flag; any clone can cancel. A cancelled run returns
/// [`GridFeedError::Cancelled`] without a final publish and without firing
/// the completion callback.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next yield boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    /// Rows in the final collection.
    pub rows: u64,
    /// Total cells across all rows (`rows * schema width`).
    pub cells: u64,
    /// Partial snapshots published before the final one.
    pub partial_publishes: u64,
}

/// Drives generation runs for one schema + configuration.
///
/// A generator admits one run at a time: starting a second run while one is
/// in flight is rejected with [`GridFeedError::RunInFlight`] rather than
/// implicitly cancelling the active run. Instances are cheap; hosts that
/// want overlapping runs create one generator per run.
#[derive(Debug)]
pub struct Generator {
    schema: ColumnSchema,
    config: GenerateConfig,
    active: StdCell<bool>,
}

/// Clears the active flag on every exit path of a run.
struct ActiveGuard<'a>(&'a StdCell<bool>);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Generator {
    /// Create a generator with default configuration.
    #[must_use]
    pub fn new(schema: ColumnSchema) -> Self {
        Self::with_config(schema, GenerateConfig::default())
    }

    /// Create a generator with explicit configuration.
    #[must_use]
    pub fn with_config(schema: ColumnSchema, config: GenerateConfig) -> Self {
        Self {
            schema,
            config,
            active: StdCell::new(false),
        }
    }

    /// The schema this generator projects against.
    #[must_use]
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Whether a run is currently in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Run one full generation pass.
    ///
    /// Publishes zero or more partial snapshots and, on success, exactly
    /// one final snapshot followed by exactly one `on_complete` call.
    ///
    /// # Errors
    /// - source fetch failure propagates before anything is published
    /// - [`GridFeedError::RunInFlight`] if another run is active
    /// - [`GridFeedError::Cancelled`] if the token fires at a yield boundary
    /// - [`GridFeedError::SchemaMismatch`] if projection drifts from the schema
    pub async fn run<Src, Y, K, F>(
        &self,
        source: &Src,
        scheduler: &Y,
        sink: &mut K,
        cancel: &CancelToken,
        on_complete: F,
    ) -> Result<GenerateSummary>
    where
        Src: RecordSource,
        Y: YieldScheduler,
        K: RowSink,
        F: FnOnce(),
    {
        if self.active.get() {
            return Err(GridFeedError::RunInFlight);
        }
        self.active.set(true);
        let _guard = ActiveGuard(&self.active);

        // The one failure that aborts before any publish.
        let records = source.fetch().await?;
        debug!(records = records.len(), "starting generation run");

        let batch = self.config.batch_size.max(1);
        let priority = self.config.priority;
        let mut rows: Rows = Vec::with_capacity(records.len());
        let mut partial_publishes: u64 = 0;
        let mut row_idx: u64 = 0;

        for (i, raw) in records.iter().enumerate() {
            if i > 0 && i % batch == 0 {
                // The token is honored at every batch boundary, whether or
                // not the host asks for the thread back.
                if cancel.is_cancelled() {
                    debug!(rows = rows.len(), "run cancelled at yield boundary");
                    return Err(GridFeedError::Cancelled);
                }
                if scheduler.should_yield(priority) {
                    trace!(rows = rows.len(), "yield boundary: publishing partial");
                    sink.publish(&rows, true);
                    partial_publishes += 1;
                    scheduler.yield_control(priority).await;
                    // Cancellation may have been requested while suspended.
                    if cancel.is_cancelled() {
                        debug!(rows = rows.len(), "run cancelled during suspension");
                        return Err(GridFeedError::Cancelled);
                    }
                }
            }

            let record = normalize(raw);
            rows.push(project_row(row_idx, &record, &self.schema)?);
            row_idx += 1;
        }

        sink.publish(&rows, false);
        let summary = GenerateSummary {
            rows: row_idx,
            cells: row_idx * self.schema.width(),
            partial_publishes,
        };
        debug!(
            rows = summary.rows,
            partials = summary.partial_publishes,
            "generation run complete"
        );
        on_complete();
        Ok(summary)
    }
}
