//! Builders to construct runners from configuration.

pub mod runner_builder;

pub use runner_builder::{build_runners, RunnerBuilder};
