//! Error types for runner operations.

use thiserror::Error;

use super::outcome::TaskFailure;

/// Errors raised by the runner itself, before or around task execution.
///
/// Individual task failures are never reported through this type; they are
/// captured as [`TaskFailure`] values inside the result collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    /// Malformed call, e.g. a concurrency limit below 1.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Configuration failed validation or could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Runtime adapter failure (no runtime available, spawner unusable).
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl RunnerError {
    /// Error for a concurrency limit that admits no tasks.
    pub(crate) fn zero_limit() -> Self {
        Self::InvalidArgument("concurrency limit must be at least 1".into())
    }
}

/// Error returned by fail-fast runs.
#[derive(Debug, Error)]
pub enum FailFastError<E> {
    /// The run was rejected before any task started.
    #[error(transparent)]
    Runner(#[from] RunnerError),
    /// A task settled with a failure; no further tasks were admitted.
    #[error("task {index} failed: {failure}")]
    Task {
        /// Input index of the failing task.
        index: usize,
        /// The captured failure.
        failure: TaskFailure<E>,
    },
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
