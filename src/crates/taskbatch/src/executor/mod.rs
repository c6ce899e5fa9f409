//! Batch execution engine
//!
//! `group` holds the timeout/cancellation racer, `coordinator` the stateful
//! façade on top of it. This module defines the type-erased operation shape
//! both share, plus the retry decorator that wraps individual operations
//! before they enter a concurrency scope.

pub mod coordinator;
pub(crate) mod group;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cancellation::CancellationReason;
use crate::retry::RetryStrategy;

pub use coordinator::{BatchCoordinator, BatchMetrics};

/// Boxed future produced by one operation invocation
pub type OperationFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// A batch operation: a re-invokable, type-erased async callable
///
/// Re-invokability is what lets the retry decorator run the same operation
/// again after a failure.
pub type Operation<T> = Arc<dyn Fn() -> OperationFuture<T> + Send + Sync>;

/// Erase an async closure into an [`Operation`]
///
/// # Arguments
/// * `f` - Closure producing a fresh future per invocation
pub fn operation<T, F, Fut>(f: F) -> Operation<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = anyhow::Result<T>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// Decorate an operation with a per-operation retry loop
///
/// The returned operation retries internally according to `strategy`, so the
/// concurrency scope only ever sees the terminal outcome for this index.
/// Cancellation is checked before every attempt and is never retried.
pub(crate) fn wrap_with_retry<T>(
    op: Operation<T>,
    strategy: RetryStrategy,
    index: usize,
    token: CancellationToken,
) -> Operation<T>
where
    T: Send + 'static,
{
    Arc::new(move || {
        let op = Arc::clone(&op);
        let token = token.clone();
        async move {
            let mut attempt = 1u32;
            loop {
                if token.is_cancelled() {
                    return Err(anyhow::Error::new(CancellationReason::SystemCancelled(
                        Some("batch cancelled during retry".to_string()),
                    )));
                }

                match op().await {
                    Ok(value) => {
                        if attempt > 1 {
                            debug!(index, attempt, "operation succeeded after retry");
                        }
                        return Ok(value);
                    }
                    Err(error) => {
                        // Cancellation is terminal, never retried
                        if error.downcast_ref::<CancellationReason>().is_some() {
                            return Err(error);
                        }

                        let Some(delay) = strategy.delay_for_attempt(attempt) else {
                            if attempt > 1 {
                                warn!(
                                    index,
                                    attempt,
                                    error = %error,
                                    "operation failed, retries exhausted"
                                );
                            }
                            return Err(error);
                        };

                        warn!(
                            index,
                            attempt,
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
        .boxed()
    })
}
