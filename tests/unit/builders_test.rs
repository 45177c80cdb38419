//! Tests for builder modules

use std::collections::HashMap;
use std::time::Duration;

use bounded_runner::builders::{build_runners, RunnerBuilder};
use bounded_runner::config::{RunnerConfig, RunnersConfig};
use bounded_runner::{RunnerError, TaskPolicy};

#[test]
fn test_runner_builder_defaults() {
    let builder = RunnerBuilder::new("crawler", RunnerConfig::new(6));
    assert_eq!(builder.name(), "crawler");
    assert_eq!(builder.config().limit, 6);

    let runner = builder.build().unwrap();
    assert_eq!(runner.name(), "crawler");
    assert_eq!(runner.limit(), 6);
    assert!(runner.policy().is_passthrough());
}

#[test]
fn test_runner_builder_policy_override() {
    let policy = TaskPolicy::new().with_task_timeout(Duration::from_millis(75));
    let runner = RunnerBuilder::new("crawler", RunnerConfig::new(2).with_retries(5, 0))
        .with_policy(policy)
        .build()
        .unwrap();
    assert_eq!(runner.policy(), &policy);
}

#[test]
fn test_runner_builder_invalid_limit() {
    let err = RunnerBuilder::new("broken", RunnerConfig::new(0)).build().unwrap_err();
    assert!(matches!(err, RunnerError::InvalidArgument(_)));
}

#[test]
fn test_build_runners_from_config() {
    let mut runners = HashMap::new();
    runners.insert("fast".to_string(), RunnerConfig::new(16));
    runners.insert("slow".to_string(), RunnerConfig::new(1).with_task_timeout_ms(10_000));

    let built = build_runners(&RunnersConfig { runners }).unwrap();
    assert_eq!(built.len(), 2);
    assert_eq!(built["fast"].limit(), 16);
    assert_eq!(built["slow"].name(), "slow");
    assert_eq!(built["slow"].policy().timeout, Some(Duration::from_secs(10)));
}

#[test]
fn test_build_runners_rejects_invalid() {
    let err = build_runners(&RunnersConfig {
        runners: HashMap::new(),
    })
    .unwrap_err();
    assert!(matches!(err, RunnerError::InvalidConfig(_)));
}
