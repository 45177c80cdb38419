//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use bounded_runner::config::runner::{ENV_LIMIT, ENV_MAX_RETRIES, ENV_RETRY_DELAY_MS, ENV_TASK_TIMEOUT_MS};
use bounded_runner::config::{RunnerConfig, RunnersConfig};

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_runner_config_validation() {
    let valid = RunnerConfig::new(4).with_task_timeout_ms(1_000).with_retries(2, 50);
    assert!(valid.validate().is_ok());
}

#[test]
fn test_runner_config_invalid_limit() {
    let invalid = RunnerConfig::new(0);
    assert_eq!(invalid.validate().unwrap_err(), "limit must be greater than 0");
}

#[test]
fn test_runner_config_invalid_timeout() {
    let invalid = RunnerConfig::new(1).with_task_timeout_ms(0);
    assert!(invalid.validate().is_err());
}

#[test]
fn test_runner_config_default_limit_is_positive() {
    let config = RunnerConfig::default();
    assert!(config.limit >= 1);
    assert_eq!(config.task_timeout_ms, None);
    assert_eq!(config.max_retries, 0);
}

#[test]
fn test_runner_config_task_policy() {
    let policy = RunnerConfig::new(2).with_task_timeout_ms(300).with_retries(4, 25).task_policy();
    assert_eq!(policy.timeout, Some(Duration::from_millis(300)));
    assert_eq!(policy.max_retries, 4);
    assert_eq!(policy.retry_delay, Duration::from_millis(25));

    assert!(RunnerConfig::new(2).task_policy().is_passthrough());
}

#[test]
fn test_runner_config_from_json() {
    let json = r#"{
        "limit": 8,
        "task_timeout_ms": 5000,
        "max_retries": 2
    }"#;

    let config = RunnerConfig::from_json_str(json).unwrap();
    assert_eq!(config.limit, 8);
    assert_eq!(config.task_timeout_ms, Some(5000));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.retry_delay_ms, 0);
}

#[test]
fn test_runner_config_from_json_rejects_zero_and_negative_limits() {
    let zero = RunnerConfig::from_json_str(r#"{ "limit": 0 }"#);
    assert!(zero.is_err());

    let negative = RunnerConfig::from_json_str(r#"{ "limit": -1 }"#);
    let err = negative.unwrap_err();
    assert!(err.starts_with("parse error"), "{err}");
}

#[test]
fn test_runner_config_from_lookup() {
    let config = RunnerConfig::from_lookup(lookup_from(&[
        (ENV_LIMIT, "16"),
        (ENV_TASK_TIMEOUT_MS, "2500"),
        (ENV_MAX_RETRIES, " 3 "),
        (ENV_RETRY_DELAY_MS, "100"),
    ]))
    .unwrap();

    assert_eq!(config, RunnerConfig::new(16).with_task_timeout_ms(2500).with_retries(3, 100));
}

#[test]
fn test_runner_config_from_lookup_invalid_values() {
    let err = RunnerConfig::from_lookup(lookup_from(&[(ENV_LIMIT, "-1")])).unwrap_err();
    assert!(err.contains(ENV_LIMIT), "{err}");

    let err = RunnerConfig::from_lookup(lookup_from(&[(ENV_LIMIT, "0")])).unwrap_err();
    assert_eq!(err, "limit must be greater than 0");
}

#[test]
fn test_runners_config_validation() {
    let mut runners = HashMap::new();
    runners.insert("crawler".to_string(), RunnerConfig::new(8));
    let config = RunnersConfig { runners };
    assert!(config.validate().is_ok());

    let empty = RunnersConfig {
        runners: HashMap::new(),
    };
    assert!(empty.validate().is_err());
}

#[test]
fn test_runners_config_from_json_names_invalid_runner() {
    let json = r#"{
        "runners": {
            "uploads": { "limit": 0 }
        }
    }"#;

    let err = RunnersConfig::from_json_str(json).unwrap_err();
    assert_eq!(err, "runner `uploads` invalid: limit must be greater than 0");
}
