//! Bounded retry with exponential backoff.
//!
//! The retry decision is a predicate over the outcome, so callers can retry
//! on errors, on status codes, or on both.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub outcome: T,
    pub attempts: u32,
}

/// Retry schedule: up to `max_attempts` tries, waiting `base_delay * 2^(n-1)`
/// after the n-th failed attempt, clamped to `[base_delay, max_delay]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Default backoff with a custom attempt count (at least one).
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Retry without waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .clamp(self.base_delay, self.max_delay.max(self.base_delay))
    }

    /// Run `op` until `should_retry` rejects its outcome or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut, P>(&self, mut op: F, mut should_retry: P) -> Attempted<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
        P: FnMut(&T) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = op(attempt).await;
            if attempt >= max_attempts || !should_retry(&outcome) {
                return Attempted {
                    outcome,
                    attempts: attempt,
                };
            }

            let wait = self.delay_for(attempt);
            warn!(
                "Attempt {}/{} failed, waiting {:?} before retrying",
                attempt, max_attempts, wait
            );
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_ladder() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(10), Duration::from_secs(8));
        assert_eq!(policy.delay_for(64), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_stops_at_max_attempts() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::immediate(3)
            .run(
                |_| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("boom")
                },
                |outcome| outcome.is_err(),
            )
            .await;

        assert_eq!(result.attempts, 3);
        assert!(result.outcome.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_when_predicate_rejects() {
        let result = RetryPolicy::immediate(5)
            .run(|attempt| async move { attempt }, |n| *n < 2)
            .await;
        assert_eq!(result.outcome, 2);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::immediate(1)
        };
        let result = policy.run(|_| async { 7 }, |_| true).await;
        assert_eq!(result.attempts, 1);
    }
}
