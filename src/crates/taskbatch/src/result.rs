//! Per-operation and aggregated batch outcomes
//!
//! Every submitted operation resolves to exactly one `TaskResult` tagged with
//! its original submission index; `BatchResult` collects them sorted back
//! into submission order, however the completions interleaved.

use std::time::Duration;

use crate::error::WrappedError;

/// Outcome of a single operation, tagged with its submission index
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult<T> {
    /// The operation produced a value
    Success { index: usize, value: T },

    /// The operation failed, was cancelled, or timed out
    Failure { index: usize, error: WrappedError },
}

impl<T> TaskResult<T> {
    /// Create a successful result
    pub fn success(index: usize, value: T) -> Self {
        Self::Success { index, value }
    }

    /// Create a failed result
    pub fn failure(index: usize, error: WrappedError) -> Self {
        Self::Failure { index, error }
    }

    /// Original submission index of the operation
    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// Whether the operation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregated outcome of a batch run
///
/// Successes and failures are sorted by original submission index, and
/// `successes.len() + failures.len()` equals the number of submitted
/// operations whenever the batch reached a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult<T> {
    /// Successful operations in submission order
    pub successes: Vec<(usize, T)>,

    /// Failed operations in submission order
    pub failures: Vec<(usize, WrappedError)>,

    /// Wall-clock duration from scope entry to scope exit
    pub duration: Duration,
}

impl<T> BatchResult<T> {
    /// Result of an empty batch
    pub fn empty(duration: Duration) -> Self {
        Self {
            successes: Vec::new(),
            failures: Vec::new(),
            duration,
        }
    }

    /// Assemble a batch result from unordered task results
    pub fn from_task_results(results: Vec<TaskResult<T>>, duration: Duration) -> Self {
        let mut successes = Vec::new();
        let mut failures = Vec::new();

        for result in results {
            match result {
                TaskResult::Success { index, value } => successes.push((index, value)),
                TaskResult::Failure { index, error } => failures.push((index, error)),
            }
        }

        successes.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|(index, _)| *index);

        Self {
            successes,
            failures,
            duration,
        }
    }

    /// Number of submitted operations accounted for
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Whether no operation failed
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether every operation failed
    pub fn all_failed(&self) -> bool {
        self.successes.is_empty() && !self.failures.is_empty()
    }

    /// Whether at least one operation succeeded and at least one failed
    pub fn has_partial_success(&self) -> bool {
        !self.successes.is_empty() && !self.failures.is_empty()
    }

    /// Fraction of operations that succeeded, 0.0 for an empty batch
    pub fn success_rate(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            0.0
        } else {
            self.successes.len() as f64 / total as f64
        }
    }

    /// Successful values in submission order
    pub fn values(&self) -> Vec<&T> {
        self.successes.iter().map(|(_, value)| value).collect()
    }

    /// Successful values in submission order, consuming the result
    pub fn into_values(self) -> Vec<T> {
        self.successes.into_iter().map(|(_, value)| value).collect()
    }

    /// Failure details in submission order
    pub fn errors(&self) -> Vec<&WrappedError> {
        self.failures.iter().map(|(_, error)| error).collect()
    }

    /// Cloned failure details in submission order
    pub fn errors_cloned(&self) -> Vec<WrappedError> {
        self.failures.iter().map(|(_, error)| error.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> BatchResult<i32> {
        BatchResult::from_task_results(
            vec![
                TaskResult::success(2, 20),
                TaskResult::failure(3, WrappedError::timeout(3)),
                TaskResult::success(0, 0),
                TaskResult::failure(1, WrappedError::cancelled(1)),
            ],
            Duration::from_millis(42),
        )
    }

    #[test]
    fn test_task_result_accessors() {
        let ok = TaskResult::success(4, "value");
        assert_eq!(ok.index(), 4);
        assert!(ok.is_success());

        let err: TaskResult<&str> = TaskResult::failure(7, WrappedError::cancelled(7));
        assert_eq!(err.index(), 7);
        assert!(!err.is_success());
    }

    #[test]
    fn test_results_sorted_by_submission_index() {
        let result = sample_result();

        let success_indices: Vec<usize> = result.successes.iter().map(|(i, _)| *i).collect();
        assert_eq!(success_indices, vec![0, 2]);

        let failure_indices: Vec<usize> = result.failures.iter().map(|(i, _)| *i).collect();
        assert_eq!(failure_indices, vec![1, 3]);
    }

    #[test]
    fn test_conservation() {
        let result = sample_result();
        assert_eq!(result.total_count(), 4);
        assert_eq!(result.successes.len() + result.failures.len(), 4);
    }

    #[test]
    fn test_derived_flags() {
        let result = sample_result();
        assert!(!result.all_succeeded());
        assert!(!result.all_failed());
        assert!(result.has_partial_success());
        assert_eq!(result.success_rate(), 0.5);
    }

    #[test]
    fn test_all_succeeded() {
        let result = BatchResult::from_task_results(
            vec![TaskResult::success(0, 1), TaskResult::success(1, 2)],
            Duration::ZERO,
        );
        assert!(result.all_succeeded());
        assert!(!result.all_failed());
        assert!(!result.has_partial_success());
        assert_eq!(result.success_rate(), 1.0);
        assert_eq!(result.into_values(), vec![1, 2]);
    }

    #[test]
    fn test_all_failed() {
        let result: BatchResult<i32> = BatchResult::from_task_results(
            vec![
                TaskResult::failure(0, WrappedError::timeout(0)),
                TaskResult::failure(1, WrappedError::timeout(1)),
            ],
            Duration::ZERO,
        );
        assert!(result.all_failed());
        assert!(!result.all_succeeded());
        assert_eq!(result.success_rate(), 0.0);
        assert_eq!(result.errors().len(), 2);
    }

    #[test]
    fn test_empty_batch_result() {
        let result: BatchResult<i32> = BatchResult::empty(Duration::ZERO);
        assert_eq!(result.total_count(), 0);
        assert!(result.all_succeeded());
        assert!(!result.all_failed());
        assert!(!result.has_partial_success());
        assert_eq!(result.success_rate(), 0.0);
    }

    #[test]
    fn test_values_in_submission_order() {
        let result = BatchResult::from_task_results(
            vec![
                TaskResult::success(2, "c"),
                TaskResult::success(0, "a"),
                TaskResult::success(1, "b"),
            ],
            Duration::ZERO,
        );
        assert_eq!(result.into_values(), vec!["a", "b", "c"]);
    }
}
