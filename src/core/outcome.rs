//! Per-task outcomes recorded in the result collection.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a task did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum TaskFailure<E> {
    /// The task's own future resolved to an error.
    #[error("{0}")]
    Failed(E),
    /// The task did not settle within the configured timeout.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    /// The task body panicked while running on a spawned worker.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl<E> TaskFailure<E> {
    /// Returns the task's own error, if this failure carries one.
    pub fn into_error(self) -> Option<E> {
        match self {
            Self::Failed(err) => Some(err),
            Self::TimedOut(_) | Self::Panicked(_) => None,
        }
    }

    /// Short description that does not require `E: Display`.
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Failed(_) => "failed".into(),
            Self::TimedOut(limit) => format!("timed out after {limit:?}"),
            Self::Panicked(message) => format!("panicked: {message}"),
        }
    }

    /// True when the failure came from a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// Settled state of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "value")]
pub enum Outcome<T, E> {
    /// The task resolved with a value.
    Success(T),
    /// The task failed; the runner kept going.
    Failure(TaskFailure<E>),
}

impl<T, E> Outcome<T, E> {
    /// True if the task succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// True if the task failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrow the success value.
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrow the failure.
    pub const fn failure(&self) -> Option<&TaskFailure<E>> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Build an outcome from a policy-wrapped result.
    pub(crate) fn from_attempt(result: Result<T, TaskFailure<E>>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }

    /// Convert into a plain `Result`.
    ///
    /// # Errors
    ///
    /// Returns the captured [`TaskFailure`] if the task failed.
    pub fn into_result(self) -> Result<T, TaskFailure<E>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(err) => Self::Failure(TaskFailure::Failed(err)),
        }
    }
}
