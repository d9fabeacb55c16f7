//! Host scheduling abstraction for cooperative yielding.
//!
//! The generator never talks to a host event loop directly. It asks an
//! injected [`YieldScheduler`] two things at each batch boundary: "does the
//! host want the thread back?" (synchronous, cheap) and, if so, "suspend me
//! until the host reschedules" (awaitable). Any cooperative multitasking
//! primitive — event loop, thread-pool task, actor mailbox — can sit behind
//! the trait.

use std::cell::Cell as StdCell;
use std::time::{Duration, Instant};

/// Urgency label the host uses to decide how aggressively to reclaim the
/// thread from a running task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Work the user is blocked on.
    UserBlocking,
    /// Work the user can see progressing.
    UserVisible,
    /// Lowest urgency, safe to defer. Row generation runs here.
    Background,
}

/// Cooperative scheduling contract injected into the generator.
// Single-threaded cooperative model; futures need not be Send.
#[allow(async_fn_in_trait)]
pub trait YieldScheduler {
    /// Non-blocking readiness check: should the running task cede the
    /// thread to pending higher-priority work?
    fn should_yield(&self, priority: Priority) -> bool;

    /// Suspend until the host schedules the task again.
    async fn yield_control(&self, priority: Priority);
}

/// Scheduler that never asks for the thread back. The run executes in one
/// uninterrupted pass with no partial publishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverYield;

impl YieldScheduler for NeverYield {
    fn should_yield(&self, _priority: Priority) -> bool {
        false
    }

    async fn yield_control(&self, _priority: Priority) {}
}

/// Scheduler that is always ready to yield. Every batch boundary becomes a
/// suspension point, which makes partial-publish behavior deterministic —
/// useful in tests and simple hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct EagerYield;

impl YieldScheduler for EagerYield {
    fn should_yield(&self, _priority: Priority) -> bool {
        true
    }

    async fn yield_control(&self, _priority: Priority) {}
}

/// Elapsed-budget scheduler: yields once the task has held the thread
/// longer than its timeslice, suspending via `tokio::task::yield_now` so
/// other tasks on the current-thread runtime get a turn.
#[derive(Debug)]
pub struct TimesliceYield {
    budget: Duration,
    slice_start: StdCell<Instant>,
}

impl TimesliceYield {
    /// Timeslice granted to background work before it must yield.
    pub const DEFAULT_BUDGET: Duration = Duration::from_millis(16);

    /// Create a scheduler with the given timeslice budget.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            slice_start: StdCell::new(Instant::now()),
        }
    }

    fn budget_for(&self, priority: Priority) -> Duration {
        // Background work gets the plain budget; more urgent work may hold
        // the thread longer before another task preempts it.
        match priority {
            Priority::UserBlocking => self.budget * 4,
            Priority::UserVisible => self.budget * 2,
            Priority::Background => self.budget,
        }
    }
}

impl Default for TimesliceYield {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUDGET)
    }
}

impl YieldScheduler for TimesliceYield {
    fn should_yield(&self, priority: Priority) -> bool {
        self.slice_start.get().elapsed() >= self.budget_for(priority)
    }

    async fn yield_control(&self, _priority: Priority) {
        tokio::task::yield_now().await;
        self.slice_start.set(Instant::now());
    }
}
