//! Execution configuration for batch runs
//!
//! Immutable value objects bundling the timeout, concurrency limit,
//! early-cancellation flag, and retry strategy for one batch call. Presets
//! cover the common profiles; `with_*` builders tweak individual fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryStrategy;

/// Configuration for a single concurrency scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroupConfiguration {
    /// Wall-clock timeout for the whole batch; `None` disables the timer
    pub timeout: Option<Duration>,

    /// Cancel all remaining operations as soon as one fails
    pub cancel_on_first_error: bool,

    /// Peak number of operations running at once; `None` is unbounded
    pub max_concurrency: Option<usize>,
}

impl Default for TaskGroupConfiguration {
    fn default() -> Self {
        Self {
            timeout: None,
            cancel_on_first_error: false,
            max_concurrency: None,
        }
    }
}

impl TaskGroupConfiguration {
    /// 30 second timeout, no early cancellation
    pub fn standard() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            ..Self::default()
        }
    }

    /// 120 second timeout, runs every operation to completion
    pub fn conservative() -> Self {
        Self {
            timeout: Some(Duration::from_secs(120)),
            cancel_on_first_error: false,
            max_concurrency: None,
        }
    }

    /// 10 second timeout, cancels everything on the first failure
    pub fn aggressive() -> Self {
        Self {
            timeout: Some(Duration::from_secs(10)),
            cancel_on_first_error: true,
            max_concurrency: None,
        }
    }

    /// Set the batch timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the cancel-on-first-error flag
    pub fn with_cancel_on_first_error(mut self, cancel: bool) -> Self {
        self.cancel_on_first_error = cancel;
        self
    }

    /// Set the concurrency cap
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }
}

/// Options for one batch call: scope configuration, retry, failure policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskBatchOptions {
    /// Concurrency scope configuration
    pub configuration: TaskGroupConfiguration,

    /// Per-operation retry strategy applied before operations enter the scope
    pub retry_strategy: RetryStrategy,

    /// Treat any operation failure as a batch failure
    pub throw_on_any_failure: bool,
}

impl TaskBatchOptions {
    /// Fail the batch if any single operation fails
    pub fn strict() -> Self {
        Self {
            throw_on_any_failure: true,
            ..Self::default()
        }
    }

    /// Default options with the given batch timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            configuration: TaskGroupConfiguration::default().with_timeout(timeout),
            ..Self::default()
        }
    }

    /// Default options with exponential retry, 1s to 30s over 3 attempts
    pub fn with_retry() -> Self {
        Self {
            retry_strategy: RetryStrategy::exponential_backoff(30, 3),
            ..Self::default()
        }
    }

    /// Set the scope configuration
    pub fn with_configuration(mut self, configuration: TaskGroupConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Set the retry strategy
    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.retry_strategy = strategy;
        self
    }
}
