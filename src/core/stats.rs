//! Runner statistics.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

use super::outcome::{Outcome, TaskFailure};

/// Snapshot of runner utilization, cumulative across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Concurrency limit of the runner.
    pub limit: usize,
    /// Tasks whose factory has been invoked.
    pub admitted_tasks: u64,
    /// Tasks that settled successfully.
    pub succeeded_tasks: u64,
    /// Tasks that settled with their own error.
    pub failed_tasks: u64,
    /// Tasks that settled because their last attempt timed out.
    pub timed_out_tasks: u64,
    /// Tasks whose body panicked.
    pub panicked_tasks: u64,
    /// Re-invocations performed by the retry policy.
    pub retries: u64,
    /// Tasks in flight right now.
    pub in_flight: usize,
    /// Highest in-flight count ever observed.
    pub peak_in_flight: usize,
}

impl RunStats {
    /// Total settled tasks.
    #[must_use]
    pub const fn settled_tasks(&self) -> u64 {
        self.succeeded_tasks + self.failed_tasks + self.timed_out_tasks + self.panicked_tasks
    }
}

/// Internal counters for runner statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    admitted_tasks: AtomicU64,
    succeeded_tasks: AtomicU64,
    failed_tasks: AtomicU64,
    timed_out_tasks: AtomicU64,
    panicked_tasks: AtomicU64,
    retries: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl RunCounters {
    /// Record an admission; returns the in-flight count including the new task.
    pub fn admitted(&self) -> usize {
        self.admitted_tasks.fetch_add(1, Ordering::Relaxed);
        let in_flight = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(in_flight, Ordering::AcqRel);
        in_flight
    }

    /// Record a settlement; returns the in-flight count after removal.
    pub fn settled<T, E>(&self, outcome: &Outcome<T, E>) -> usize {
        let counter = match outcome {
            Outcome::Success(_) => &self.succeeded_tasks,
            Outcome::Failure(TaskFailure::Failed(_)) => &self.failed_tasks,
            Outcome::Failure(TaskFailure::TimedOut(_)) => &self.timed_out_tasks,
            Outcome::Failure(TaskFailure::Panicked(_)) => &self.panicked_tasks,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.released()
    }

    /// Drop a task from the in-flight count without recording an outcome.
    pub fn released(&self) -> usize {
        self.in_flight.fetch_sub(1, Ordering::AcqRel).saturating_sub(1)
    }

    pub fn retried(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, limit: usize) -> RunStats {
        RunStats {
            limit,
            admitted_tasks: self.admitted_tasks.load(Ordering::Relaxed),
            succeeded_tasks: self.succeeded_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            timed_out_tasks: self.timed_out_tasks.load(Ordering::Relaxed),
            panicked_tasks: self.panicked_tasks.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Acquire),
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}
