//! Fixed-interval polling with a bounded number of attempts

use std::future::Future;
use std::time::Duration;

/// Default number of attempts for a readiness poll
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default pause between two attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// How often and how long to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of checks, including the first one
    pub max_attempts: u32,

    /// Pause between consecutive checks
    pub interval: Duration,
}

impl RetryPolicy {
    /// Create a new policy
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Set the maximum number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the interval between attempts
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Total time spent sleeping if every attempt fails
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL)
    }
}

/// Result of a bounded poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The check passed on attempt `attempts` (1-based)
    Ready { attempts: u32 },

    /// Every attempt failed
    Exhausted { attempts: u32 },
}

impl PollOutcome {
    /// True if the check eventually passed
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    /// Number of checks performed
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts } | PollOutcome::Exhausted { attempts } => *attempts,
        }
    }
}

/// Run `check` until it returns `true` or the policy runs out of attempts
///
/// `check` receives the 1-based attempt number. Polling stops at the first
/// `true`; there is no sleep after the last attempt.
pub async fn poll_until<F, Fut>(policy: RetryPolicy, mut check: F) -> PollOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=policy.max_attempts {
        if check(attempt).await {
            return PollOutcome::Ready { attempts: attempt };
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(policy.interval, Duration::from_millis(100));
        assert_eq!(policy.max_wait(), Duration::from_millis(2900));
    }

    #[tokio::test]
    async fn test_stops_on_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = poll_until(fast(30), move |attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                attempt == 4
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 4 });
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = poll_until(fast(7), move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }
        })
        .await;

        assert!(!outcome.is_ready());
        assert_eq!(outcome.attempts(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_zero_attempts_never_checks() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let outcome = poll_until(fast(0), move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 0 });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
