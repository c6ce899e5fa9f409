//! # Taskbatch - Structured-Concurrency Batch Execution
//!
//! A batch execution engine for running collections of independent
//! asynchronous operations with bounded concurrency, per-batch timeouts,
//! cooperative cancellation, partial-failure aggregation, and
//! retry-with-backoff.
//!
//! ## Features
//!
//! - **Ordered results** - Outcomes are always delivered in submission-index
//!   order, regardless of completion order
//! - **Batch timeouts** - A timer task races the workers; whichever finishes
//!   first decides the run
//! - **Cooperative cancellation** - Tasks observe a `CancellationToken` at
//!   entry and after completion; completed work is never discarded
//! - **Admission control** - `max_concurrency` bounds peak parallelism
//!   without changing result semantics
//! - **Per-operation retry** - Operations are transparently wrapped in retry
//!   loops before they enter the concurrency scope
//! - **Partial-failure aggregation** - Every submission index resolves to
//!   exactly one success or failure
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use taskbatch::{operation, BatchCoordinator};
//!
//! # async fn example() -> taskbatch::Result<()> {
//! let coordinator = BatchCoordinator::new();
//!
//! let operations = vec![
//!     operation(|| async { Ok::<u32, anyhow::Error>(1) }),
//!     operation(|| async { Ok::<u32, anyhow::Error>(2) }),
//! ];
//!
//! // Values come back in submission order
//! let values = coordinator.execute_batch(operations, None).await?;
//! assert_eq!(values, vec![1, 2]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The coordinator is a serialized façade: its counters and default options
//! live behind one mutex, while the operations it launches run concurrently
//! in a `tokio::task::JoinSet` scope. Callers that must inspect partial
//! failures use `execute_batch_collecting`, which never fails for
//! operation-level errors; `execute_batch` is the throwing entry point that
//! interprets the aggregate outcome.

// Core modules
pub mod cancellation;
pub mod config;
pub mod result;
pub mod retry;

// Executor module
pub mod executor;

// Error types and utilities
mod error;

// Re-export key types for convenience
pub use cancellation::CancellationReason;
pub use config::{TaskBatchOptions, TaskGroupConfiguration};
pub use executor::{operation, BatchCoordinator, BatchMetrics, Operation, OperationFuture};
pub use result::{BatchResult, TaskResult};
pub use retry::RetryStrategy;

// Error types
pub use error::{BatchError, Result, TaskGroupError, WrappedError};
