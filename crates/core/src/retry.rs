//! Exponential-backoff policy shared by the subscriber runner and the
//! asynchronous-prediction poller.
//!
//! The policy itself is pure: it only computes delays and checks the elapsed
//! budget. Sleeping is left to the caller so the same policy can drive both
//! redelivery loops and status polling.

use std::time::Duration;

/// Tunable parameters for an exponential-backoff strategy with an overall
/// elapsed-time budget.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Maximum total time to keep retrying before giving up.
    pub max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_elapsed: Duration::from_secs(300),
        }
    }
}

impl BackoffPolicy {
    /// Calculate the delay that follows `current`, clamped to `max_delay`.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_delay)
    }

    /// Whether the elapsed-time budget has been spent.
    pub fn is_exhausted(&self, elapsed: Duration) -> bool {
        elapsed >= self.max_elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_delay(Duration::from_secs(1)), Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let policy = BackoffPolicy {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(policy.next_delay(Duration::from_secs(8)), Duration::from_secs(10));
    }

    #[test]
    fn full_backoff_sequence() {
        let policy = BackoffPolicy::default();
        let mut delay = policy.initial_delay;
        let expected = [1, 2, 4, 8, 16, 30, 30, 30];

        for &expected_secs in &expected {
            assert_eq!(delay.as_secs(), expected_secs);
            delay = policy.next_delay(delay);
        }
    }

    #[test]
    fn budget_exhaustion() {
        let policy = BackoffPolicy {
            max_elapsed: Duration::from_secs(60),
            ..Default::default()
        };
        assert!(!policy.is_exhausted(Duration::from_secs(59)));
        assert!(policy.is_exhausted(Duration::from_secs(60)));
    }
}
