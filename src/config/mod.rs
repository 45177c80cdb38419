//! Configuration models for runners, policies, and environment loading.

pub mod runner;

pub use runner::{RunnerConfig, RunnersConfig};
