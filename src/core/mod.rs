//! Core runner abstractions: coordination, outcomes, policies and accounting.

pub mod audit;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod policy;
pub mod runner;
pub mod spawned;
pub mod stats;

pub use audit::{
    build_audit_event, AuditAction, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink,
};
pub use error::{AppResult, FailFastError, RunnerError};
pub use executor::TaskExecutor;
pub use outcome::{Outcome, TaskFailure};
pub use policy::{retry, with_timeout, TaskPolicy};
pub use runner::{run_bounded, run_bounded_fail_fast, TaskRunner};
pub use spawned::{Spawn, SpawnedRunner};
pub use stats::RunStats;
