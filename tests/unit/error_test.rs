//! Tests for error types

use bounded_runner::{RunnerError, TaskFailure};
use std::time::Duration;

#[test]
fn test_invalid_argument_error() {
    let err = RunnerError::InvalidArgument("limit must be at least 1".to_string());
    assert_eq!(format!("{}", err), "invalid argument: limit must be at least 1");
}

#[test]
fn test_invalid_config_error() {
    let err = RunnerError::InvalidConfig("limit must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: limit must be greater than 0");
}

#[test]
fn test_runtime_error() {
    let err = RunnerError::Runtime("no reactor running".to_string());
    assert_eq!(format!("{}", err), "runtime error: no reactor running");
}

#[test]
fn test_task_failure_display() {
    let err: TaskFailure<String> = TaskFailure::Failed("connection reset".to_string());
    assert_eq!(format!("{}", err), "connection reset");

    let err: TaskFailure<String> = TaskFailure::TimedOut(Duration::from_secs(2));
    assert_eq!(format!("{}", err), "timed out after 2s");

    let err: TaskFailure<String> = TaskFailure::Panicked("index out of bounds".to_string());
    assert_eq!(format!("{}", err), "panicked: index out of bounds");
}

#[test]
fn test_task_failure_into_error() {
    let err: TaskFailure<&str> = TaskFailure::Failed("boom");
    assert_eq!(err.into_error(), Some("boom"));

    let err: TaskFailure<&str> = TaskFailure::Panicked("oops".to_string());
    assert_eq!(err.into_error(), None);
}
