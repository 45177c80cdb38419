//! Runner configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::TaskPolicy;

/// Environment variable holding the concurrency limit.
pub const ENV_LIMIT: &str = "BOUNDED_RUNNER_LIMIT";
/// Environment variable holding the per-attempt timeout in milliseconds.
pub const ENV_TASK_TIMEOUT_MS: &str = "BOUNDED_RUNNER_TASK_TIMEOUT_MS";
/// Environment variable holding the retry count.
pub const ENV_MAX_RETRIES: &str = "BOUNDED_RUNNER_MAX_RETRIES";
/// Environment variable holding the delay between retries in milliseconds.
pub const ENV_RETRY_DELAY_MS: &str = "BOUNDED_RUNNER_RETRY_DELAY_MS";

fn default_limit() -> usize {
    num_cpus::get().max(1)
}

/// Runner configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Maximum tasks in flight at once.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Per-attempt timeout in milliseconds; absent means no timeout.
    #[serde(default)]
    pub task_timeout_ms: Option<u64>,
    /// Additional attempts after a task fails.
    #[serde(default)]
    pub max_retries: u32,
    /// Delay between attempts in milliseconds.
    #[serde(default)]
    pub retry_delay_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(default_limit())
    }
}

impl RunnerConfig {
    /// Configuration with `limit` and no timeout or retries.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            limit,
            task_timeout_ms: None,
            max_retries: 0,
            retry_delay_ms: 0,
        }
    }

    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_task_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.task_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the retry count and delay.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be greater than 0".into());
        }
        if self.task_timeout_ms == Some(0) {
            return Err("task_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Task policy described by this configuration.
    #[must_use]
    pub const fn task_policy(&self) -> TaskPolicy {
        let policy = TaskPolicy::new().with_retries(self.max_retries, Duration::from_millis(self.retry_delay_ms));
        match self.task_timeout_ms {
            Some(ms) => policy.with_task_timeout(Duration::from_millis(ms)),
            None => policy,
        }
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse errors (including a negative limit) and validation errors.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Unparsable values and validation errors.
    pub fn from_env() -> Result<Self, String> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Unparsable values and validation errors.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, String>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(limit) = parse_var(&lookup, ENV_LIMIT)? {
            cfg.limit = limit;
        }
        if let Some(timeout_ms) = parse_var(&lookup, ENV_TASK_TIMEOUT_MS)? {
            cfg.task_timeout_ms = Some(timeout_ms);
        }
        if let Some(max_retries) = parse_var(&lookup, ENV_MAX_RETRIES)? {
            cfg.max_retries = max_retries;
        }
        if let Some(delay_ms) = parse_var(&lookup, ENV_RETRY_DELAY_MS)? {
            cfg.retry_delay_ms = delay_ms;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<L, V>(lookup: &L, key: &str) -> Result<Option<V>, String>
where
    L: Fn(&str) -> Option<String>,
    V: std::str::FromStr,
    V::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<V>()
                .map_err(|e| format!("{key}={raw:?} is invalid: {e}"))
        })
        .transpose()
}

/// Named runner configurations, e.g. one per downstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnersConfig {
    /// Map of runner name to configuration.
    pub runners: HashMap<String, RunnerConfig>,
}

impl RunnersConfig {
    /// Validate all runners and ensure at least one exists.
    ///
    /// # Errors
    ///
    /// Names the first invalid runner.
    pub fn validate(&self) -> Result<(), String> {
        if self.runners.is_empty() {
            return Err("at least one runner must be defined".into());
        }
        for (name, runner) in &self.runners {
            runner
                .validate()
                .map_err(|e| format!("runner `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse runner configurations from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse and validation errors.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
