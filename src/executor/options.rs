use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SqlExecutorError;
use crate::queryable::Queryable;

use super::SqlExecutor;

/// How the executor retries `Queryable::connect` before running a job.
///
/// The default retries forever with no pause between attempts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Give up (failing the job with `ConnectionError`) after this many attempts.
    pub max_attempts: Option<u32>,
    /// Pause between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl RetryPolicy {
    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    #[must_use]
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Options for configuring a `SqlExecutor`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorOptions {
    pub connect_retry: RetryPolicy,
}

impl ExecutorOptions {
    #[must_use]
    pub fn builder() -> ExecutorOptionsBuilder {
        ExecutorOptionsBuilder::default()
    }

    /// Parse options from JSON, e.g. `{"connect_retry": {"max_attempts": 5, "backoff_ms": 250}}`.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` if the JSON does not describe valid options.
    pub fn from_json(json: &str) -> Result<Self, SqlExecutorError> {
        serde_json::from_str(json)
            .map_err(|e| SqlExecutorError::ConfigError(format!("invalid executor options: {e}")))
    }
}

/// Fluent builder for `ExecutorOptions`.
#[derive(Debug, Clone, Default)]
pub struct ExecutorOptionsBuilder {
    opts: ExecutorOptions,
}

impl ExecutorOptionsBuilder {
    #[must_use]
    pub fn max_connect_attempts(mut self, attempts: u32) -> Self {
        self.opts.connect_retry.max_attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn connect_backoff(mut self, backoff: Duration) -> Self {
        self.opts.connect_retry.backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn finish(self) -> ExecutorOptions {
        self.opts
    }

    /// Build a `SqlExecutor` over `queryable` with these options.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` when called outside a tokio runtime.
    pub fn build(self, queryable: Arc<dyn Queryable>) -> Result<SqlExecutor, SqlExecutorError> {
        SqlExecutor::new(queryable, self.finish())
    }
}
