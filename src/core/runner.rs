//! Bounded-concurrency task runner.
//!
//! A single coordinator walks the task sequence in order, invoking each task
//! factory and adding the resulting future to the in-flight set. Whenever the
//! set holds `limit` futures the walk suspends until any one of them settles.
//! Outcomes are written to the slot reserved for the task at admission, so
//! the result collection is always in input order regardless of completion
//! order.
//!
//! ```text
//!   tasks ──► admit (factory()) ──► in-flight set (<= limit) ──► settle
//!               ▲                          │                       │
//!               └──── resume walk ◄────────┴── slot[index] = outcome
//! ```
//!
//! Task bodies run on the coordinator's own task; they interleave at await
//! points and never need a lock. For task bodies on parallel threads see
//! [`SpawnedRunner`](crate::core::SpawnedRunner).

use std::convert::Infallible;
use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;

use futures::stream::{self, FuturesUnordered, Stream, StreamExt};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::core::audit::{build_audit_event, AuditAction, AuditSink, SharedAuditSink};
use crate::core::error::{FailFastError, RunnerError};
use crate::core::executor::TaskExecutor;
use crate::core::outcome::{Outcome, TaskFailure};
use crate::core::policy::TaskPolicy;
use crate::core::stats::{RunCounters, RunStats};

/// Run `tasks` with at most `limit` in flight, collecting every outcome.
///
/// Each factory is invoked exactly once, in input order. A failing task is
/// recorded as [`Outcome::Failure`] at its index and does not stop the run.
///
/// # Errors
///
/// [`RunnerError::InvalidArgument`] if `limit` is 0; no factory is invoked.
///
/// # Example
///
/// ```rust,ignore
/// use bounded_runner::{run_bounded, Outcome};
///
/// let tasks = (0..5).map(|i| move || async move { Ok::<_, String>(i * 10) });
/// let outcomes = run_bounded(tasks, 2).await?;
/// assert_eq!(outcomes[3], Outcome::Success(30));
/// ```
pub async fn run_bounded<I, F, Fut, T, E>(
    tasks: I,
    limit: usize,
) -> Result<Vec<Outcome<T, E>>, RunnerError>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if limit == 0 {
        return Err(RunnerError::zero_limit());
    }
    let tasks = stream::iter(tasks).map(|factory| {
        move || {
            let future = factory();
            async move { Outcome::from(future.await) }
        }
    });
    match drive(tasks, limit, &mut Unobserved).await {
        Ok(outcomes) => Ok(outcomes),
        Err(never) => match never {},
    }
}

/// Run `tasks` with at most `limit` in flight, stopping at the first failure.
///
/// On success the values come back in input order. The first task to settle
/// unsuccessfully stops admission and every task still in flight is dropped.
///
/// # Errors
///
/// [`FailFastError::Runner`] if `limit` is 0, before any factory is invoked;
/// [`FailFastError::Task`] with the index and failure of the first failing task.
pub async fn run_bounded_fail_fast<I, F, Fut, T, E>(tasks: I, limit: usize) -> Result<Vec<T>, FailFastError<E>>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if limit == 0 {
        return Err(RunnerError::zero_limit().into());
    }
    let recorder = Recorder::new(Arc::new(RunCounters::default()), None);
    let tasks = stream::iter(tasks).map(|factory| {
        move || {
            let future = factory();
            async move { Outcome::from(future.await) }
        }
    });
    match drive(tasks, limit, &mut FailFast(&recorder)).await {
        Ok(outcomes) => Ok(outcomes.into_iter().filter_map(|o| o.into_result().ok()).collect()),
        Err((index, failure)) => Err(FailFastError::Task { index, failure }),
    }
}

/// Hooks the coordinator calls as tasks move through their lifecycle.
pub(crate) trait Lifecycle<O> {
    /// Value that ends a run early.
    type Halt;

    /// Task `index` joined the in-flight set.
    fn admitted(&mut self, _index: usize, _in_flight: usize) {}

    /// Task `index` settled. `Continue` hands the outcome back for storage.
    fn settled(&mut self, index: usize, outcome: O, in_flight: usize) -> ControlFlow<Self::Halt, O>;

    /// The run halted with `count` tasks still in flight; they are dropped.
    fn abandoned(&mut self, _count: usize) {}
}

struct Unobserved;

impl<O> Lifecycle<O> for Unobserved {
    type Halt = Infallible;

    fn settled(&mut self, _index: usize, outcome: O, _in_flight: usize) -> ControlFlow<Infallible, O> {
        ControlFlow::Continue(outcome)
    }
}

/// Coordinator loop shared by every single-task runner entry point.
///
/// Admission is preferred over reaping so the in-flight set refills as soon
/// as a slot opens. While waiting for the next factory from `tasks` the
/// in-flight futures keep being polled.
pub(crate) async fn drive<S, G, Fut, O, L>(tasks: S, limit: usize, lifecycle: &mut L) -> Result<Vec<O>, L::Halt>
where
    S: Stream<Item = G>,
    G: FnOnce() -> Fut,
    Fut: Future<Output = O>,
    L: Lifecycle<O>,
{
    debug_assert!(limit >= 1, "limit validated by caller");
    let mut tasks = std::pin::pin!(tasks);
    let mut slots: Vec<Option<O>> = Vec::new();
    let mut in_flight = FuturesUnordered::new();
    let mut exhausted = false;

    loop {
        if exhausted && in_flight.is_empty() {
            break;
        }
        let admitting = !exhausted && in_flight.len() < limit;

        tokio::select! {
            biased;

            next = tasks.next(), if admitting => match next {
                Some(factory) => {
                    let index = slots.len();
                    slots.push(None);
                    let future = factory();
                    in_flight.push(async move { (index, future.await) });
                    lifecycle.admitted(index, in_flight.len());
                }
                None => exhausted = true,
            },

            Some((index, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                match lifecycle.settled(index, outcome, in_flight.len()) {
                    ControlFlow::Continue(outcome) => slots[index] = Some(outcome),
                    ControlFlow::Break(halt) => {
                        lifecycle.abandoned(in_flight.len());
                        return Err(halt);
                    }
                }
            }
        }
    }

    debug_assert!(slots.iter().all(Option::is_some));
    Ok(slots.into_iter().flatten().collect())
}

/// Stats and audit bookkeeping for one run.
pub(crate) struct Recorder {
    run_id: String,
    counters: Arc<RunCounters>,
    audit: Option<SharedAuditSink>,
}

impl Recorder {
    pub(crate) fn new(counters: Arc<RunCounters>, audit: Option<SharedAuditSink>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            counters,
            audit,
        }
    }

    pub(crate) fn run_id(&self) -> &str {
        &self.run_id
    }

    pub(crate) fn admit(&self, index: usize, in_flight: usize) {
        self.counters.admitted();
        tracing::trace!(run_id = %self.run_id, index, in_flight, "task admitted");
        self.audit(index, AuditAction::Admit, in_flight, None);
    }

    pub(crate) fn settle<T, E>(&self, index: usize, outcome: &Outcome<T, E>, in_flight: usize) {
        self.counters.settled(outcome);
        match outcome {
            Outcome::Success(_) => {
                tracing::trace!(run_id = %self.run_id, index, in_flight, "task succeeded");
                self.audit(index, AuditAction::Succeed, in_flight, None);
            }
            Outcome::Failure(failure) => {
                let summary = failure.summary();
                tracing::debug!(run_id = %self.run_id, index, in_flight, failure = %summary, "task failed");
                self.audit(index, AuditAction::Fail, in_flight, Some(summary));
            }
        }
    }

    pub(crate) fn halt(&self, index: usize, in_flight: usize) {
        tracing::warn!(run_id = %self.run_id, index, abandoned = in_flight, "run halted on task failure");
        self.audit(index, AuditAction::Halt, in_flight, None);
    }

    pub(crate) fn abandon(&self, count: usize) {
        for _ in 0..count {
            self.counters.released();
        }
    }

    fn audit(&self, index: usize, action: AuditAction, in_flight: usize, detail: Option<String>) {
        if let Some(sink) = &self.audit {
            sink.lock()
                .record(build_audit_event(self.run_id.clone(), index, action, in_flight, detail));
        }
    }
}

struct CollectAll<'a>(&'a Recorder);

impl<T, E> Lifecycle<Outcome<T, E>> for CollectAll<'_> {
    type Halt = Infallible;

    fn admitted(&mut self, index: usize, in_flight: usize) {
        self.0.admit(index, in_flight);
    }

    fn settled(
        &mut self,
        index: usize,
        outcome: Outcome<T, E>,
        in_flight: usize,
    ) -> ControlFlow<Infallible, Outcome<T, E>> {
        self.0.settle(index, &outcome, in_flight);
        ControlFlow::Continue(outcome)
    }
}

struct FailFast<'a>(&'a Recorder);

impl<T, E> Lifecycle<Outcome<T, E>> for FailFast<'_> {
    type Halt = (usize, TaskFailure<E>);

    fn admitted(&mut self, index: usize, in_flight: usize) {
        self.0.admit(index, in_flight);
    }

    fn settled(
        &mut self,
        index: usize,
        outcome: Outcome<T, E>,
        in_flight: usize,
    ) -> ControlFlow<(usize, TaskFailure<E>), Outcome<T, E>> {
        self.0.settle(index, &outcome, in_flight);
        match outcome {
            Outcome::Failure(failure) => {
                self.0.halt(index, in_flight);
                ControlFlow::Break((index, failure))
            }
            success @ Outcome::Success(_) => ControlFlow::Continue(success),
        }
    }

    fn abandoned(&mut self, count: usize) {
        self.0.abandon(count);
    }
}

/// Reusable runner with a fixed limit, a per-task policy, statistics and an
/// optional audit sink.
///
/// The limit bounds each run. Runs started concurrently on the same runner
/// are bounded independently; their statistics are aggregated.
pub struct TaskRunner {
    name: String,
    limit: usize,
    policy: TaskPolicy,
    counters: Arc<RunCounters>,
    audit: Option<SharedAuditSink>,
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("name", &self.name)
            .field("limit", &self.limit)
            .field("policy", &self.policy)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl TaskRunner {
    /// Create a runner from a validated configuration.
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidArgument`] for a zero limit,
    /// [`RunnerError::InvalidConfig`] for any other invalid setting.
    pub fn new(config: &RunnerConfig) -> Result<Self, RunnerError> {
        if config.limit == 0 {
            return Err(RunnerError::zero_limit());
        }
        config.validate().map_err(RunnerError::InvalidConfig)?;
        Ok(Self {
            name: "default".into(),
            limit: config.limit,
            policy: config.task_policy(),
            counters: Arc::new(RunCounters::default()),
            audit: None,
        })
    }

    /// Create a runner with `limit` and a passthrough policy.
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidArgument`] if `limit` is 0.
    pub fn with_limit(limit: usize) -> Result<Self, RunnerError> {
        Self::new(&RunnerConfig::new(limit))
    }

    /// Name used in log fields.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
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

    /// Runner name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concurrency limit.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Per-task policy.
    #[must_use]
    pub const fn policy(&self) -> &TaskPolicy {
        &self.policy
    }

    /// Statistics aggregated over every run of this runner.
    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.counters.snapshot(self.limit)
    }

    /// Run every task, collecting outcomes in input order.
    ///
    /// Factories are `FnMut` because the retry policy may invoke them again.
    pub async fn run<I, F, Fut, T, E>(&self, tasks: I) -> Vec<Outcome<T, E>>
    where
        I: IntoIterator<Item = F>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_stream(stream::iter(tasks)).await
    }

    /// Run tasks pulled from an asynchronous stream of unknown length.
    ///
    /// Admission follows stream order; tasks already in flight keep running
    /// while the stream is pending.
    pub async fn run_stream<S, F, Fut, T, E>(&self, tasks: S) -> Vec<Outcome<T, E>>
    where
        S: Stream<Item = F>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let recorder = self.recorder();
        tracing::info!(runner = %self.name, run_id = %recorder.run_id(), limit = self.limit, "run started");

        let tasks = tasks.map(|factory| move || self.attempt(factory));
        let outcomes = match drive(tasks, self.limit, &mut CollectAll(&recorder)).await {
            Ok(outcomes) => outcomes,
            Err(never) => match never {},
        };

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        tracing::info!(
            runner = %self.name,
            run_id = %recorder.run_id(),
            tasks = outcomes.len(),
            failed,
            "run finished"
        );
        outcomes
    }

    /// Run every task unless one fails; the first failure stops admission and
    /// drops all tasks still in flight.
    ///
    /// # Errors
    ///
    /// [`FailFastError::Task`] with the index and failure of the first task
    /// to settle unsuccessfully.
    pub async fn run_fail_fast<I, F, Fut, T, E>(&self, tasks: I) -> Result<Vec<T>, FailFastError<E>>
    where
        I: IntoIterator<Item = F>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let recorder = self.recorder();
        tracing::info!(runner = %self.name, run_id = %recorder.run_id(), limit = self.limit, "fail-fast run started");

        let tasks = stream::iter(tasks).map(|factory| move || self.attempt(factory));
        match drive(tasks, self.limit, &mut FailFast(&recorder)).await {
            Ok(outcomes) => Ok(outcomes.into_iter().filter_map(|o| o.into_result().ok()).collect()),
            Err((index, failure)) => Err(FailFastError::Task { index, failure }),
        }
    }

    /// Run each payload through `executor`, one task per payload.
    pub async fn run_payloads<I, P, T, E, X>(&self, payloads: I, executor: &X) -> Vec<Outcome<T, E>>
    where
        I: IntoIterator<Item = P>,
        P: Clone + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        X: TaskExecutor<P, T, E>,
    {
        let tasks = payloads.into_iter().map(|payload| {
            let executor = executor.clone();
            move || {
                let executor = executor.clone();
                let payload = payload.clone();
                async move { executor.execute(payload).await }
            }
        });
        self.run(tasks).await
    }

    fn recorder(&self) -> Recorder {
        Recorder::new(Arc::clone(&self.counters), self.audit.clone())
    }

    async fn attempt<F, Fut, T, E>(&self, factory: F) -> Outcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let result = self
            .policy
            .execute_observed(factory, |_| self.counters.retried())
            .await;
        Outcome::from_attempt(result)
    }
}
