//! Cancellation cause vocabulary
//!
//! Describes *why* an execution stopped, as opposed to the aggregate batch
//! outcome in `error.rs`. Callers use the classification accessors to decide
//! whether a retry makes sense.

use std::time::Duration;

use thiserror::Error;

/// Reason an execution was cancelled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancellationReason {
    /// The batch exceeded its wall-clock timeout
    #[error("cancelled: batch timeout of {0:?} elapsed")]
    Timeout(Duration),

    /// The user explicitly requested cancellation
    #[error("cancelled by user request")]
    UserCancelled,

    /// The system cancelled the work, optionally with a reason
    #[error("cancelled by the system{}", .0.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    SystemCancelled(Option<String>),

    /// The parent task was cancelled before the batch started
    #[error("cancelled: parent task was cancelled")]
    ParentTaskCancelled,

    /// The enclosing batch was cancelled mid-flight
    #[error("cancelled: batch stopped after {completed} of {total} operations")]
    BatchCancelled { completed: usize, total: usize },

    /// A required resource was unavailable
    #[error("cancelled: resource unavailable: {0}")]
    ResourceUnavailable(String),
}

impl CancellationReason {
    /// Whether the cancelled work is worth retrying
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::SystemCancelled(_) | Self::ResourceUnavailable(_) => true,
            Self::UserCancelled | Self::ParentTaskCancelled | Self::BatchCancelled { .. } => false,
        }
    }

    /// Whether a user decision caused the cancellation
    pub fn is_user_initiated(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }

    /// Whether the runtime or system caused the cancellation
    pub fn is_system_initiated(&self) -> bool {
        !self.is_user_initiated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_reasons() {
        assert!(CancellationReason::Timeout(Duration::from_secs(30)).is_retriable());
        assert!(CancellationReason::SystemCancelled(None).is_retriable());
        assert!(CancellationReason::ResourceUnavailable("db pool".to_string()).is_retriable());
    }

    #[test]
    fn test_non_retriable_reasons() {
        assert!(!CancellationReason::UserCancelled.is_retriable());
        assert!(!CancellationReason::ParentTaskCancelled.is_retriable());
        assert!(!CancellationReason::BatchCancelled { completed: 2, total: 5 }.is_retriable());
    }

    #[test]
    fn test_initiator_classification() {
        assert!(CancellationReason::UserCancelled.is_user_initiated());
        assert!(!CancellationReason::UserCancelled.is_system_initiated());

        assert!(CancellationReason::ParentTaskCancelled.is_system_initiated());
        assert!(CancellationReason::Timeout(Duration::from_secs(1)).is_system_initiated());
    }

    #[test]
    fn test_display_includes_detail() {
        let reason = CancellationReason::BatchCancelled { completed: 3, total: 7 };
        let msg = reason.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('7'));

        let reason = CancellationReason::SystemCancelled(Some("shutdown".to_string()));
        assert!(reason.to_string().contains("shutdown"));

        let reason = CancellationReason::SystemCancelled(None);
        assert_eq!(reason.to_string(), "cancelled by the system");
    }
}
