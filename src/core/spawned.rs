//! Bounded runner whose task bodies execute on spawned runtime tasks.
//!
//! The coordinator still admits tasks one at a time in input order, but each
//! admitted task runs through a [`Spawn`] implementation and may execute on
//! another thread. Shared state is therefore explicit:
//!
//! - an `AtomicUsize` in-flight counter, reserved by the coordinator with a
//!   CAS loop and released by the task when it settles;
//! - a `parking_lot::Mutex` around the result collection;
//! - an mpsc channel on which every settled task reports its index, which is
//!   the coordinator's "wait for any" primitive.
//!
//! Panicking task bodies are caught and settle as [`TaskFailure::Panicked`],
//! as do task futures the spawner drops before they complete.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::config::RunnerConfig;
use crate::core::audit::{AuditSink, SharedAuditSink};
use crate::core::error::RunnerError;
use crate::core::outcome::{Outcome, TaskFailure};
use crate::core::policy::TaskPolicy;
use crate::core::runner::Recorder;
use crate::core::stats::{RunCounters, RunStats};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Result collection shared between the coordinator and spawned tasks.
type SharedSlots<T, E> = Arc<Mutex<Vec<Option<Outcome<T, E>>>>>;

/// Bounded runner that executes task bodies through a [`Spawn`] implementation.
///
/// Dropping the future returned by [`run`](Self::run) stops admission, but
/// tasks already spawned keep running to completion on the runtime.
pub struct SpawnedRunner<S> {
    limit: usize,
    policy: TaskPolicy,
    spawner: S,
    counters: Arc<RunCounters>,
    audit: Option<SharedAuditSink>,
}

impl<S> std::fmt::Debug for SpawnedRunner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedRunner")
            .field("limit", &self.limit)
            .field("policy", &self.policy)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> SpawnedRunner<S>
where
    S: Spawn,
{
    /// Create a runner with `limit` and a passthrough policy.
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidArgument`] if `limit` is 0.
    pub fn new(limit: usize, spawner: S) -> Result<Self, RunnerError> {
        Self::from_config(&RunnerConfig::new(limit), spawner)
    }

    /// Create a runner from a validated configuration.
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidArgument`] for a zero limit,
    /// [`RunnerError::InvalidConfig`] for any other invalid setting.
    pub fn from_config(config: &RunnerConfig, spawner: S) -> Result<Self, RunnerError> {
        if config.limit == 0 {
            return Err(RunnerError::zero_limit());
        }
        config.validate().map_err(RunnerError::InvalidConfig)?;
        Ok(Self {
            limit: config.limit,
            policy: config.task_policy(),
            spawner,
            counters: Arc::new(RunCounters::default()),
            audit: None,
        })
    }

    /// Replace the per-task policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(Arc::new(Mutex::new(audit)));
        self
    }

    /// Concurrency limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Statistics aggregated over every run of this runner.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.counters.snapshot(self.limit)
    }

    /// Run every task on the spawner, collecting outcomes in input order.
    pub async fn run<I, F, Fut, T, E>(&self, tasks: I) -> Vec<Outcome<T, E>>
    where
        I: IntoIterator<Item = F>,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let recorder = Arc::new(Recorder::new(Arc::clone(&self.counters), self.audit.clone()));
        tracing::info!(run_id = %recorder.run_id(), limit = self.limit, "spawned run started");

        let slots: SharedSlots<T, E> = Arc::new(Mutex::new(Vec::new()));
        let active = Arc::new(AtomicUsize::new(0));
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<usize>();

        for factory in tasks {
            // `settled_tx` is still held here, so `recv` only returns once a
            // task has released its slot.
            while !try_reserve(&active, self.limit) {
                settled_rx.recv().await;
            }

            let index = {
                let mut slots = slots.lock();
                slots.push(None);
                slots.len() - 1
            };
            recorder.admit(index, active.load(Ordering::Acquire));

            let task = SpawnedTask {
                index,
                policy: self.policy,
                outcome: None,
                slots: Arc::clone(&slots),
                active: Arc::clone(&active),
                counters: Arc::clone(&self.counters),
                recorder: Arc::clone(&recorder),
                settled_tx: settled_tx.clone(),
            };
            self.spawner.spawn(task.run(factory));
        }

        // Every task holds a sender until it has settled, dropped or not.
        drop(settled_tx);
        while settled_rx.recv().await.is_some() {}

        let outcomes: Vec<Outcome<T, E>> = std::mem::take(&mut *slots.lock()).into_iter().flatten().collect();
        tracing::info!(
            run_id = %recorder.run_id(),
            tasks = outcomes.len(),
            failed = outcomes.iter().filter(|o| o.is_failure()).count(),
            "spawned run finished"
        );
        outcomes
    }
}

/// Reserve one in-flight slot if fewer than `limit` are taken.
fn try_reserve(active: &AtomicUsize, limit: usize) -> bool {
    let mut current = active.load(Ordering::Acquire);
    loop {
        if current >= limit {
            return false;
        }
        match active.compare_exchange_weak(current, current + 1, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
}

/// Failure recorded for a task whose future was dropped before it settled.
const DROPPED_BEFORE_SETTLING: &str = "task dropped before settling";

/// Everything a spawned task needs to settle itself.
///
/// Settlement happens in `Drop`, so a task future the spawner discards
/// without running (e.g. on a runtime that has shut down) still frees its
/// slot and reports its index.
struct SpawnedTask<T, E> {
    index: usize,
    policy: TaskPolicy,
    outcome: Option<Outcome<T, E>>,
    slots: SharedSlots<T, E>,
    active: Arc<AtomicUsize>,
    counters: Arc<RunCounters>,
    recorder: Arc<Recorder>,
    settled_tx: mpsc::UnboundedSender<usize>,
}

impl<T, E> SpawnedTask<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    async fn run<F, Fut>(mut self, factory: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let counters = Arc::clone(&self.counters);
        let attempt = self.policy.execute_observed(factory, move |_| counters.retried());
        let outcome = match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(result) => Outcome::from_attempt(result),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(index = self.index, panic = %message, "task panicked");
                Outcome::Failure(TaskFailure::Panicked(message))
            }
        };
        self.outcome = Some(outcome);
    }
}

impl<T, E> Drop for SpawnedTask<T, E> {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or_else(|| {
            tracing::warn!(
                run_id = %self.recorder.run_id(),
                index = self.index,
                "task dropped before settling"
            );
            Outcome::Failure(TaskFailure::Panicked(DROPPED_BEFORE_SETTLING.to_string()))
        });

        // Release the stats slot before the admission slot so the counters
        // never observe more than `limit` tasks in flight.
        let in_flight = self.active.load(Ordering::Acquire).saturating_sub(1);
        self.recorder.settle(self.index, &outcome, in_flight);
        if let Some(slot) = self.slots.lock().get_mut(self.index) {
            *slot = Some(outcome);
        }
        self.active.fetch_sub(1, Ordering::AcqRel);
        // The coordinator may already be gone; nothing to notify then.
        let _ = self.settled_tx.send(self.index);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
