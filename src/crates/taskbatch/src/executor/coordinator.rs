//! Batch coordinator - stateful façade over the racer
//!
//! Owns the default options, the cumulative execution counters, and the root
//! cancellation token. Every batch runs under a child token, so cancelling
//! one batch never poisons the coordinator itself.

use std::future::Future;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancellation::CancellationReason;
use crate::config::TaskBatchOptions;
use crate::error::{Result, TaskGroupError, WrappedError};
use crate::executor::group::run_group;
use crate::executor::{wrap_with_retry, Operation};
use crate::result::BatchResult;
use crate::retry::RetryStrategy;

/// Cumulative execution metrics across all batches run by one coordinator
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BatchMetrics {
    /// Operations executed across all batches
    pub total_operations: u64,

    /// Operations that succeeded
    pub successes: u64,

    /// Operations that failed
    pub failures: u64,

    /// Fraction of operations that succeeded, 0.0 before any execution
    pub success_rate: f64,
}

/// Serialized coordinator state: options and counters share one lock
struct CoordinatorState {
    default_options: TaskBatchOptions,
    total_operations_executed: u64,
    total_successes: u64,
    total_failures: u64,
}

/// Stateful façade for running batches of independent async operations
///
/// Composes the retry decorator, the timeout/cancellation racer, and result
/// aggregation behind four entry points. Each coordinator instance owns its
/// own metrics lifecycle; nothing is process-global.
pub struct BatchCoordinator {
    state: Mutex<CoordinatorState>,
    cancel_token: CancellationToken,
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchCoordinator {
    /// Create a coordinator with default options
    pub fn new() -> Self {
        Self::with_options(TaskBatchOptions::default())
    }

    /// Create a coordinator with the given default options
    pub fn with_options(default_options: TaskBatchOptions) -> Self {
        Self {
            state: Mutex::new(CoordinatorState {
                default_options,
                total_operations_executed: 0,
                total_successes: 0,
                total_failures: 0,
            }),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Execute a batch and return the successful values in submission order
    ///
    /// # Errors
    /// `EmptyBatch` for an empty operation list, `ParentTaskCancelled` when
    /// cancellation is observed before any work starts, `AllFailed` when
    /// every operation failed, and `PartialFailure` when some failed and the
    /// options demand throwing on any failure. A partial outcome without that
    /// flag silently returns only the successful subset.
    pub async fn execute_batch<T>(
        &self,
        operations: Vec<Operation<T>>,
        options: Option<TaskBatchOptions>,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
    {
        if operations.is_empty() {
            return Err(TaskGroupError::EmptyBatch.into());
        }
        if self.cancel_token.is_cancelled() {
            return Err(CancellationReason::ParentTaskCancelled.into());
        }

        let options = options.unwrap_or_else(|| self.default_options());
        let throw_on_any_failure = options.throw_on_any_failure;

        let result = self.execute_batch_collecting(operations, Some(options)).await;
        self.record_batch(&result);

        if result.all_succeeded() {
            return Ok(result.into_values());
        }
        if result.all_failed() {
            return Err(TaskGroupError::AllFailed(result.errors_cloned()).into());
        }
        if throw_on_any_failure {
            return Err(TaskGroupError::PartialFailure {
                success_count: result.successes.len(),
                errors: result.errors_cloned(),
            }
            .into());
        }

        // Partial success without the strict flag: failures are dropped from
        // the return value; callers that need them use
        // `execute_batch_collecting`.
        Ok(result.into_values())
    }

    /// Execute a batch and return the full per-operation outcome
    ///
    /// Never fails for operation-level errors. When the effective retry
    /// strategy is not `None`, each operation is wrapped in a retry loop
    /// before entering the scope, so the racer only ever sees terminal
    /// outcomes.
    pub async fn execute_batch_collecting<T>(
        &self,
        operations: Vec<Operation<T>>,
        options: Option<TaskBatchOptions>,
    ) -> BatchResult<T>
    where
        T: Send + 'static,
    {
        let options = options.unwrap_or_else(|| self.default_options());
        let token = self.cancel_token.child_token();
        let total = operations.len();

        let operations: Vec<Operation<T>> = match options.retry_strategy {
            RetryStrategy::None => operations,
            strategy => operations
                .into_iter()
                .enumerate()
                .map(|(index, op)| wrap_with_retry(op, strategy, index, token.clone()))
                .collect(),
        };

        info!(
            total,
            timeout_ms = options
                .configuration
                .timeout
                .map(|t| t.as_millis() as u64),
            max_concurrency = options.configuration.max_concurrency,
            cancel_on_first_error = options.configuration.cancel_on_first_error,
            "executing batch"
        );

        let result = run_group(operations, options.configuration, token).await;

        if result.all_succeeded() {
            info!(
                total,
                duration_ms = result.duration.as_millis() as u64,
                "batch completed"
            );
        } else {
            warn!(
                total,
                successes = result.successes.len(),
                failures = result.failures.len(),
                duration_ms = result.duration.as_millis() as u64,
                "batch completed with failures"
            );
        }

        result
    }

    /// Execute a batch with a concurrency cap injected into the options
    ///
    /// # Errors
    /// Identical contract to [`execute_batch`](Self::execute_batch).
    pub async fn execute_batch_with_concurrency<T>(
        &self,
        operations: Vec<Operation<T>>,
        max_concurrency: usize,
        options: Option<TaskBatchOptions>,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
    {
        let mut options = options.unwrap_or_else(|| self.default_options());
        options.configuration.max_concurrency = Some(max_concurrency);
        self.execute_batch(operations, Some(options)).await
    }

    /// Execute one operation with retry, outside any batch
    ///
    /// Cancellation is checked before every attempt; a cancellation observed
    /// in a failure is terminal and never retried.
    ///
    /// # Errors
    /// `Cancelled` when cancellation interrupts the loop,
    /// `MaxRetriesExceeded` carrying the last attempt's error once attempts
    /// are exhausted.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        max_attempts: u32,
        strategy: Option<RetryStrategy>,
        operation: F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let max_attempts = max_attempts.max(1);
        let strategy = strategy.unwrap_or_else(|| RetryStrategy::exponential_backoff(30, max_attempts));

        let mut attempt = 1u32;
        loop {
            if self.cancel_token.is_cancelled() {
                return Err(TaskGroupError::Cancelled.into());
            }

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if error.downcast_ref::<CancellationReason>().is_some() {
                        return Err(TaskGroupError::Cancelled.into());
                    }

                    // Exhausted when either the attempt budget or the
                    // strategy's own cap runs out, whichever comes first.
                    let delay = if attempt >= max_attempts {
                        None
                    } else {
                        strategy.delay_for_attempt(attempt)
                    };

                    let Some(delay) = delay else {
                        warn!(attempt, error = %error, "max retries exhausted");
                        return Err(TaskGroupError::MaxRetriesExceeded {
                            attempts: attempt,
                            last_error: WrappedError::from_error(&error, None),
                        }
                        .into());
                    };

                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "operation failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Request cancellation of everything this coordinator runs
    ///
    /// Batches already in flight observe the signal cooperatively; batches
    /// started afterwards fail their pre-flight check.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Token observed by everything this coordinator runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Current default options
    pub fn default_options(&self) -> TaskBatchOptions {
        self.state.lock().default_options
    }

    /// Replace the default options used when a call passes `None`
    pub fn update_default_options(&self, options: TaskBatchOptions) {
        self.state.lock().default_options = options;
    }

    /// Cumulative metrics across all batches run through `execute_batch`
    pub fn metrics(&self) -> BatchMetrics {
        let state = self.state.lock();
        let success_rate = if state.total_operations_executed == 0 {
            0.0
        } else {
            state.total_successes as f64 / state.total_operations_executed as f64
        };
        BatchMetrics {
            total_operations: state.total_operations_executed,
            successes: state.total_successes,
            failures: state.total_failures,
            success_rate,
        }
    }

    /// Reset the cumulative counters to zero
    pub fn reset_metrics(&self) {
        let mut state = self.state.lock();
        state.total_operations_executed = 0;
        state.total_successes = 0;
        state.total_failures = 0;
    }

    fn record_batch<T>(&self, result: &BatchResult<T>) {
        let mut state = self.state.lock();
        state.total_operations_executed += result.total_count() as u64;
        state.total_successes += result.successes.len() as u64;
        state.total_failures += result.failures.len() as u64;
    }
}
