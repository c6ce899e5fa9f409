//! Timeout/cancellation racer
//!
//! Runs a batch of operations inside one `JoinSet` scope, racing an optional
//! timer task against the workers. Whichever finishes first decides the
//! outcome: the timer stops the run, a failing worker does the same when
//! `cancel_on_first_error` is set, and every submission index that never
//! produced a collected result is accounted for with a synthesized failure.

use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::TaskGroupConfiguration;
use crate::error::WrappedError;
use crate::executor::Operation;
use crate::result::{BatchResult, TaskResult};

/// Signal produced by one task inside the scope
///
/// A tagged union rather than a downcast: the timer and the workers share a
/// single `JoinSet`, so their outputs share a type.
enum GroupSignal<T> {
    /// The batch timer elapsed before the workers finished
    Timeout,

    /// One operation reached a terminal outcome
    Completed(TaskResult<T>),
}

/// Execute `operations` under `config`, cancelling cooperatively via `token`
///
/// Always returns a `BatchResult` accounting for every submission index;
/// operation-level failures never escape as errors. Once the run is decided
/// (timeout or cancel-on-first-error) collection stops immediately: a worker
/// that finished before the deciding signal was collected keeps its result,
/// anything later is discarded and synthesized as a failure.
pub(crate) async fn run_group<T>(
    operations: Vec<Operation<T>>,
    config: TaskGroupConfiguration,
    token: CancellationToken,
) -> BatchResult<T>
where
    T: Send + 'static,
{
    let started = Instant::now();
    let total = operations.len();

    if total == 0 {
        return BatchResult::empty(started.elapsed());
    }

    let mut scope: JoinSet<GroupSignal<T>> = JoinSet::new();

    if let Some(timeout) = config.timeout {
        scope.spawn(async move {
            tokio::time::sleep(timeout).await;
            GroupSignal::Timeout
        });
    }

    // Admission control: start at most max_concurrency workers up front,
    // then admit one more for each worker that resolves.
    let mut pending = operations.into_iter().enumerate();
    let initial = config.max_concurrency.unwrap_or(total).clamp(1, total);
    let mut live_workers = 0usize;
    for _ in 0..initial {
        if let Some((index, op)) = pending.next() {
            spawn_worker(&mut scope, index, op, token.clone());
            live_workers += 1;
        }
    }

    let mut results: Vec<TaskResult<T>> = Vec::with_capacity(total);
    let mut timed_out = false;

    while live_workers > 0 {
        let Some(joined) = scope.join_next().await else {
            break;
        };

        match joined {
            Ok(GroupSignal::Timeout) => {
                debug!(
                    collected = results.len(),
                    total, "batch timer elapsed, cancelling remaining operations"
                );
                timed_out = true;
                token.cancel();
                break;
            }
            Ok(GroupSignal::Completed(result)) => {
                live_workers -= 1;
                let failed = !result.is_success();
                results.push(result);

                if failed && config.cancel_on_first_error {
                    debug!(
                        collected = results.len(),
                        total, "operation failed, cancelling remaining operations"
                    );
                    token.cancel();
                    break;
                }

                if let Some((index, op)) = pending.next() {
                    spawn_worker(&mut scope, index, op, token.clone());
                    live_workers += 1;
                }
            }
            Err(join_error) => {
                // A panicked worker leaves its index unaccounted; synthesis
                // below keeps the conservation invariant.
                live_workers -= 1;
                warn!(error = %join_error, "batch worker terminated abnormally");

                if let Some((index, op)) = pending.next() {
                    spawn_worker(&mut scope, index, op, token.clone());
                    live_workers += 1;
                }
            }
        }
    }

    // Dropping the scope aborts the timer and any still-running workers.
    drop(scope);

    // Synthesize a failure for every index without a collected result:
    // workers still in flight when the run was decided, operations queued
    // behind the admission gate, and abnormally terminated workers.
    let mut accounted = vec![false; total];
    for result in &results {
        accounted[result.index()] = true;
    }
    for (index, seen) in accounted.into_iter().enumerate() {
        if !seen {
            let error = if timed_out {
                WrappedError::timeout(index)
            } else {
                WrappedError::cancelled(index)
            };
            results.push(TaskResult::failure(index, error));
        }
    }

    BatchResult::from_task_results(results, started.elapsed())
}

/// Spawn one worker task tagged with its submission index
fn spawn_worker<T>(
    scope: &mut JoinSet<GroupSignal<T>>,
    index: usize,
    op: Operation<T>,
    token: CancellationToken,
) where
    T: Send + 'static,
{
    scope.spawn(async move {
        if token.is_cancelled() {
            return GroupSignal::Completed(TaskResult::failure(
                index,
                WrappedError::cancelled(index),
            ));
        }

        // Biased toward the operation: a finished operation beats a
        // concurrent cancellation signal, so completed work is never thrown
        // away.
        let outcome = tokio::select! {
            biased;
            outcome = op() => outcome,
            () = token.cancelled() => {
                return GroupSignal::Completed(TaskResult::failure(
                    index,
                    WrappedError::cancelled(index),
                ));
            }
        };

        match outcome {
            Ok(value) => {
                if token.is_cancelled() {
                    debug!(index, "operation completed after cancellation, keeping its result");
                }
                GroupSignal::Completed(TaskResult::success(index, value))
            }
            Err(error) => GroupSignal::Completed(TaskResult::failure(
                index,
                WrappedError::from_error(&error, Some(index)),
            )),
        }
    });
}
