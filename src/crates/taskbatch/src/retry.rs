//! Retry strategies with exponential backoff
//!
//! A strategy is a pure mapping from attempt number to delay. It performs no
//! sleeping itself; the executor layer owns the clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Strategy controlling whether and how a failed operation is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Never retry
    None,

    /// Retry with a constant delay between attempts
    Fixed {
        /// Delay before each retry
        delay: Duration,
        /// Total attempts allowed, including the first
        max_attempts: u32,
    },

    /// Retry with exponentially growing delay, capped at a maximum
    Exponential {
        /// Delay before the first retry
        base_delay: Duration,
        /// Upper bound on any single delay
        max_delay: Duration,
        /// Total attempts allowed, including the first
        max_attempts: u32,
    },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::None
    }
}

impl RetryStrategy {
    /// Exponential backoff from 1s to `max_delay_secs`, doubling per attempt
    pub fn exponential_backoff(max_delay_secs: u64, max_attempts: u32) -> Self {
        Self::Exponential {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(max_delay_secs),
            max_attempts,
        }
    }

    /// Total attempts this strategy allows, including the first
    pub fn max_attempts(&self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fixed { max_attempts, .. } | Self::Exponential { max_attempts, .. } => {
                *max_attempts
            }
        }
    }

    /// Delay before the retry following `attempt` (1-based)
    ///
    /// Returns `None` once `attempt >= max_attempts`, signaling that no
    /// further retry should happen. Exponential delays are computed in whole
    /// seconds as `base * 2^(attempt - 1)`, clamped to `max_delay`; the
    /// truncation is deterministic so tests can assert exact values.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed { delay, max_attempts } => {
                if attempt >= *max_attempts {
                    None
                } else {
                    Some(*delay)
                }
            }
            Self::Exponential {
                base_delay,
                max_delay,
                max_attempts,
            } => {
                if attempt >= *max_attempts {
                    return None;
                }
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let delay_secs = base_delay.as_secs_f64() * 2f64.powi(exponent);
                let capped = delay_secs.min(max_delay.as_secs_f64());
                Some(Duration::from_secs(capped as u64))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_retries() {
        let strategy = RetryStrategy::None;
        assert_eq!(strategy.max_attempts(), 1);
        assert_eq!(strategy.delay_for_attempt(1), None);
        assert_eq!(strategy.delay_for_attempt(10), None);
    }

    #[test]
    fn test_fixed_delay() {
        let strategy = RetryStrategy::Fixed {
            delay: Duration::from_secs(5),
            max_attempts: 3,
        };

        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_secs(5)));
        assert_eq!(strategy.delay_for_attempt(2), Some(Duration::from_secs(5)));
        // Attempt 3 is the last allowed attempt, no delay after it
        assert_eq!(strategy.delay_for_attempt(3), None);
        assert_eq!(strategy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_exponential_progression() {
        let strategy = RetryStrategy::Exponential {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_attempts: 6,
        };

        // Attempt 1: 1 * 2^0 = 1 second
        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_secs(1)));

        // Attempt 2: 1 * 2^1 = 2 seconds
        assert_eq!(strategy.delay_for_attempt(2), Some(Duration::from_secs(2)));

        // Attempt 3: 1 * 2^2 = 4 seconds
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::from_secs(4)));

        // Attempt 4: 1 * 2^3 = 8 seconds
        assert_eq!(strategy.delay_for_attempt(4), Some(Duration::from_secs(8)));
    }

    #[test]
    fn test_exponential_capped_at_max_delay() {
        let strategy = RetryStrategy::Exponential {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(30),
            max_attempts: 10,
        };

        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_secs(10)));
        assert_eq!(strategy.delay_for_attempt(2), Some(Duration::from_secs(20)));

        // 10 * 2^2 = 40 seconds, capped at 30
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::from_secs(30)));
        assert_eq!(strategy.delay_for_attempt(4), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_exponential_exhaustion() {
        let strategy = RetryStrategy::Exponential {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            max_attempts: 3,
        };

        assert!(strategy.delay_for_attempt(1).is_some());
        assert!(strategy.delay_for_attempt(2).is_some());
        assert_eq!(strategy.delay_for_attempt(3), None);
        assert_eq!(strategy.delay_for_attempt(100), None);
    }

    #[test]
    fn test_exponential_backoff_constructor() {
        let strategy = RetryStrategy::exponential_backoff(30, 3);

        assert_eq!(strategy.max_attempts(), 3);
        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(strategy.delay_for_attempt(2), Some(Duration::from_secs(2)));
        assert_eq!(strategy.delay_for_attempt(3), None);
    }

    #[test]
    fn test_serde_round_trip() {
        let strategy = RetryStrategy::Fixed {
            delay: Duration::from_secs(2),
            max_attempts: 4,
        };
        let json = serde_json::to_string(&strategy).unwrap();
        let back: RetryStrategy = serde_json::from_str(&json).unwrap();
        assert_eq!(strategy, back);
    }
}
