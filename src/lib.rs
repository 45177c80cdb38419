//! # Bounded Runner
//!
//! Run many asynchronous tasks with at most `limit` of them in flight, and get
//! every outcome back in input order.
//!
//! The crate implements the "task pool" pattern: tasks are admitted in order,
//! admission suspends whenever `limit` tasks are outstanding, and it resumes
//! as soon as any one of them settles. A failing task never aborts the run;
//! its failure is recorded at its index like any other outcome.
//!
//! ## Key Features
//!
//! - **Bounded admission**: the in-flight set never exceeds the limit
//! - **Ordered results**: outcome `i` always belongs to task `i`
//! - **Collect-all or fail-fast**: keep going past failures, or stop at the first
//! - **Task policy**: per-attempt timeouts and retries
//! - **Streamed input**: admit tasks from an async `Stream` of unknown length
//! - **Spawned execution**: run task bodies on a multi-threaded runtime
//! - **Accounting**: statistics and audit events per admission and settlement
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bounded_runner::{run_bounded, Outcome};
//!
//! let urls = vec!["a", "b", "c", "d"];
//! let tasks = urls.into_iter().map(|url| move || fetch(url));
//! let outcomes = run_bounded(tasks, 2).await?;
//! for outcome in outcomes {
//!     match outcome {
//!         Outcome::Success(body) => println!("{body}"),
//!         Outcome::Failure(reason) => eprintln!("failed: {reason}"),
//!     }
//! }
//! ```
//!
//! ## Configured Runners
//!
//! ```rust,ignore
//! use bounded_runner::builders::RunnerBuilder;
//! use bounded_runner::config::RunnerConfig;
//!
//! let runner = RunnerBuilder::new(
//!     "crawler",
//!     RunnerConfig::new(8).with_task_timeout_ms(5_000).with_retries(2, 250),
//! )
//! .build()?;
//!
//! let outcomes = runner.run(tasks).await;
//! println!("{:?}", runner.stats());
//! ```
//!
//! For complete examples, see:
//! - `tests/bounded_runner_test.rs` - ordering, limits and failure scenarios
//! - `tests/spawned_runner_test.rs` - multi-threaded execution

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core runner abstractions: coordination, outcomes, policies and accounting.
pub mod core;
/// Configuration models for runners and task policies.
pub mod config;
/// Builders to construct runners from configuration.
pub mod builders;
/// Runtime adapters for spawned execution.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    run_bounded, run_bounded_fail_fast, FailFastError, Outcome, RunStats, RunnerError,
    SpawnedRunner, TaskFailure, TaskPolicy, TaskRunner,
};
