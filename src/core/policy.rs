//! Per-task execution policy: timeouts and retries.
//!
//! A policy wraps a task factory rather than a single future, so a failed
//! attempt can be re-run by invoking the factory again. Every attempt is
//! bounded by the timeout on its own; a timed-out attempt counts as a failure
//! and is eligible for retry like any other.

use std::future::Future;
use std::time::Duration;

use super::outcome::TaskFailure;

/// Timeout and retry settings applied to each task a runner executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskPolicy {
    /// Upper bound on a single attempt. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Pause between a failed attempt and the next one.
    pub retry_delay: Duration,
}

impl TaskPolicy {
    /// Policy with no timeout and no retries.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Bound every attempt by `timeout`.
    #[must_use]
    pub const fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retry a failing task up to `max_retries` times, sleeping `delay` in between.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u32, delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = delay;
        self
    }

    /// True when the policy neither times out nor retries.
    #[must_use]
    pub const fn is_passthrough(&self) -> bool {
        self.timeout.is_none() && self.max_retries == 0
    }

    /// Run `factory` under this policy until it succeeds or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the failure of the last attempt.
    pub async fn execute<F, Fut, T, E>(&self, factory: F) -> Result<T, TaskFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_observed(factory, |_| {}).await
    }

    /// Same as [`execute`](Self::execute), calling `on_retry` with the attempt
    /// number (starting at 1) before every re-invocation.
    pub(crate) async fn execute_observed<F, Fut, T, E, R>(
        &self,
        mut factory: F,
        mut on_retry: R,
    ) -> Result<T, TaskFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnMut(u32),
    {
        let mut retries = 0;
        loop {
            let result = match self.timeout {
                Some(limit) => with_timeout(factory(), limit).await,
                None => factory().await.map_err(TaskFailure::Failed),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(_) if retries < self.max_retries => {
                    retries += 1;
                    on_retry(retries);
                    tracing::debug!(attempt = retries + 1, "retrying task");
                    if !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
                Err(failure) => return Err(failure),
            }
        }
    }
}

/// Race `future` against a timer; the future is dropped if the timer wins.
///
/// # Errors
///
/// [`TaskFailure::TimedOut`] when `limit` elapses first, otherwise the
/// future's own error wrapped in [`TaskFailure::Failed`].
pub async fn with_timeout<Fut, T, E>(future: Fut, limit: Duration) -> Result<T, TaskFailure<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result.map_err(TaskFailure::Failed),
        Err(_) => Err(TaskFailure::TimedOut(limit)),
    }
}

/// Invoke `factory`, re-invoking it up to `retries` more times on failure.
///
/// # Errors
///
/// Returns the last attempt's failure once retries are exhausted.
pub async fn retry<F, Fut, T, E>(factory: F, retries: u32, delay: Duration) -> Result<T, TaskFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    TaskPolicy::new()
        .with_retries(retries, delay)
        .execute(factory)
        .await
}
