//! Builders to construct runners from configuration.

use std::collections::HashMap;

use crate::config::{RunnerConfig, RunnersConfig};
use crate::core::{AuditSink, RunnerError, Spawn, SpawnedRunner, TaskPolicy, TaskRunner};

/// Step-by-step construction of a [`TaskRunner`] or [`SpawnedRunner`].
pub struct RunnerBuilder {
    name: String,
    config: RunnerConfig,
    policy: Option<TaskPolicy>,
    audit: Option<Box<dyn AuditSink>>,
}

impl RunnerBuilder {
    /// Start from a named configuration.
    pub fn new(name: impl Into<String>, config: RunnerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            policy: None,
            audit: None,
        }
    }

    /// Start from the environment (see [`RunnerConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidConfig`] if the environment holds invalid values.
    pub fn from_env(name: impl Into<String>) -> Result<Self, RunnerError> {
        let config = RunnerConfig::from_env().map_err(RunnerError::InvalidConfig)?;
        Ok(Self::new(name, config))
    }

    /// Runner name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration the runner will be built from.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Override the policy derived from the configuration.
    #[must_use]
    pub const fn with_policy(mut self, policy: TaskPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Attach an audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build a single-coordinator runner.
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidArgument`] or [`RunnerError::InvalidConfig`] if
    /// the configuration is invalid.
    pub fn build(self) -> Result<TaskRunner, RunnerError> {
        let mut runner = TaskRunner::new(&self.config)?.with_name(self.name);
        if let Some(policy) = self.policy {
            runner = runner.with_policy(policy);
        }
        if let Some(audit) = self.audit {
            runner = runner.with_audit(audit);
        }
        Ok(runner)
    }

    /// Build a runner whose task bodies run on `spawner`.
    ///
    /// # Errors
    ///
    /// [`RunnerError::InvalidArgument`] or [`RunnerError::InvalidConfig`] if
    /// the configuration is invalid.
    pub fn build_spawned<S: Spawn>(self, spawner: S) -> Result<SpawnedRunner<S>, RunnerError> {
        tracing::debug!(runner = %self.name, limit = self.config.limit, "building spawned runner");
        let mut runner = SpawnedRunner::from_config(&self.config, spawner)?;
        if let Some(policy) = self.policy {
            runner = runner.with_policy(policy);
        }
        if let Some(audit) = self.audit {
            runner = runner.with_audit(audit);
        }
        Ok(runner)
    }
}

/// Build one runner per named configuration.
///
/// # Errors
///
/// [`RunnerError::InvalidConfig`] if any configuration is invalid; nothing is
/// built in that case.
pub fn build_runners(cfg: &RunnersConfig) -> Result<HashMap<String, TaskRunner>, RunnerError> {
    cfg.validate().map_err(RunnerError::InvalidConfig)?;

    let mut runners = HashMap::with_capacity(cfg.runners.len());
    for (name, runner_cfg) in &cfg.runners {
        let runner = RunnerBuilder::new(name.clone(), runner_cfg.clone()).build()?;
        runners.insert(name.clone(), runner);
    }
    Ok(runners)
}
