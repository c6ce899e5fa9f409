//! Error types for batch execution
//!
//! Provides the leaf error carrier for individual operation failures and the
//! aggregate error vocabulary produced when a batch is interpreted.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cancellation::CancellationReason;

/// Result type alias for batch operations
pub type Result<T> = std::result::Result<T, BatchError>;

/// Value-type wrapper carrying an operation failure across task boundaries
///
/// Heterogeneous operation errors are reduced to a description, a type label,
/// and the index of the operation that produced them, so they stay comparable
/// and cloneable regardless of the underlying error type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{description}")]
pub struct WrappedError {
    /// Human-readable description of the failure
    pub description: String,

    /// Type label: "TimeoutError", "CancellationError", or "OperationError"
    pub error_type: String,

    /// Index of the operation that failed, if known
    pub operation_index: Option<usize>,
}

impl WrappedError {
    /// Wrap an arbitrary operation error
    pub fn from_error(error: &anyhow::Error, operation_index: Option<usize>) -> Self {
        let error_type = if error.downcast_ref::<CancellationReason>().is_some() {
            "CancellationError"
        } else {
            "OperationError"
        };

        Self {
            description: format!("{:#}", error),
            error_type: error_type.to_string(),
            operation_index,
        }
    }

    /// Synthesized failure for an operation that never finished before the
    /// batch timed out
    pub fn timeout(operation_index: usize) -> Self {
        Self {
            description: "operation did not complete before the batch timeout".to_string(),
            error_type: "TimeoutError".to_string(),
            operation_index: Some(operation_index),
        }
    }

    /// Synthesized failure for an operation cancelled before completion
    pub fn cancelled(operation_index: usize) -> Self {
        Self {
            description: "operation was cancelled before completion".to_string(),
            error_type: "CancellationError".to_string(),
            operation_index: Some(operation_index),
        }
    }

    /// Whether this failure originated from the batch timeout
    pub fn is_timeout(&self) -> bool {
        self.error_type == "TimeoutError"
    }

    /// Whether this failure originated from cancellation
    pub fn is_cancellation(&self) -> bool {
        self.error_type == "CancellationError"
    }
}

/// Aggregate outcome error for a batch execution
///
/// Constructed only at the boundary where a `BatchResult` is interpreted for
/// the throwing entry points; never stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskGroupError {
    /// Some operations succeeded and some failed
    #[error("batch partially failed: {success_count} succeeded, {} failed", .errors.len())]
    PartialFailure {
        success_count: usize,
        errors: Vec<WrappedError>,
    },

    /// The batch was cancelled before it could resolve
    #[error("batch was cancelled")]
    Cancelled,

    /// The batch exceeded its configured timeout
    #[error("batch timed out after {0:?}")]
    Timeout(Duration),

    /// Every operation in the batch failed
    #[error("all {} operations failed", .0.len())]
    AllFailed(Vec<WrappedError>),

    /// An empty operation list was submitted to a throwing entry point
    #[error("cannot execute an empty batch")]
    EmptyBatch,

    /// A retried operation exhausted its attempts
    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        attempts: u32,
        last_error: WrappedError,
    },
}

impl TaskGroupError {
    /// Whether the failure is worth retrying at a higher level
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_)
            | Self::PartialFailure { .. }
            | Self::AllFailed(_)
            | Self::MaxRetriesExceeded { .. } => true,
            Self::Cancelled | Self::EmptyBatch => false,
        }
    }

    /// Whether at least one operation succeeded before this error was raised
    pub fn has_partial_success(&self) -> bool {
        matches!(self, Self::PartialFailure { success_count, .. } if *success_count > 0)
    }

    /// Nested operation errors, regardless of which variant wraps them
    pub fn contained_errors(&self) -> &[WrappedError] {
        match self {
            Self::PartialFailure { errors, .. } | Self::AllFailed(errors) => errors,
            Self::MaxRetriesExceeded { last_error, .. } => std::slice::from_ref(last_error),
            Self::Cancelled | Self::Timeout(_) | Self::EmptyBatch => &[],
        }
    }
}

/// Top-level error returned by the throwing coordinator entry points
///
/// A batch call fails either with an aggregate outcome or with a cancellation
/// observed before any work started; both vocabularies pass through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    /// Aggregate batch outcome
    #[error(transparent)]
    Group(#[from] TaskGroupError),

    /// Cancellation observed before the batch started
    #[error(transparent)]
    Cancelled(#[from] CancellationReason),
}

impl BatchError {
    /// Whether the failure is worth retrying at a higher level
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Group(err) => err.is_retriable(),
            Self::Cancelled(reason) => reason.is_retriable(),
        }
    }
}
