//! Retry logic for server requests with explicit error classification.

use log::{debug, warn};
use std::collections::hash_map::RandomState;
use std::future::Future;
use std::hash::BuildHasher;
use std::time::Duration;

use crate::error::{NenDBError, Result};

/// Default first backoff delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(250);

/// Default upper bound for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The failure is transient; another attempt may succeed.
    Retry,
    /// The failure is final; surface it immediately.
    Fail,
}

/// Decides whether an error is worth another attempt.
///
/// Transport failures, timeouts and 5xx responses are retried. Validation,
/// protocol and 4xx errors will not change on a second attempt.
pub fn classify(error: &NenDBError) -> RetryDecision {
    if error.is_retryable() {
        RetryDecision::Retry
    } else {
        RetryDecision::Fail
    }
}

/// Bounded retry with exponential backoff and equal jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: crate::config::DEFAULT_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
            max_delay,
        }
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Upper bound of the delay after the given failed attempt (1-based).
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay before the next attempt, drawn uniformly from `[ceiling / 2, ceiling]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        let half = ceiling / 2;
        half + half.mul_f64(jitter_fraction(attempt))
    }
}

/// A value in `[0, 1)` that differs between calls.
fn jitter_fraction(attempt: u32) -> f64 {
    let hash = RandomState::new().hash_one(attempt);
    (hash % 10_000) as f64 / 10_000.0
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts the policy. The last observed error is returned on exhaustion.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if classify(&error) == RetryDecision::Fail {
            debug!("{}: non-retryable error: {}", operation_name, error);
            return Err(error);
        }

        if attempt >= max_attempts {
            warn!(
                "{}: giving up after {} attempt(s): {}",
                operation_name, attempt, error
            );
            return Err(error);
        }

        let delay = policy.delay(attempt);
        warn!(
            "{}: attempt {}/{} failed ({}), retrying in {}ms...",
            operation_name,
            attempt,
            max_attempts,
            error,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy::new(retries, Duration::from_millis(1), Duration::from_millis(4))
    }

    fn server_error(status: u16) -> NenDBError {
        NenDBError::Server {
            status,
            message: "boom".to_string(),
            details: None,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            classify(&NenDBError::connection("x", "refused")),
            RetryDecision::Retry
        );
        assert_eq!(classify(&server_error(502)), RetryDecision::Retry);
        assert_eq!(classify(&server_error(409)), RetryDecision::Fail);
        assert_eq!(
            classify(&NenDBError::validation("bad")),
            RetryDecision::Fail
        );
    }

    #[test]
    fn test_ceiling_grows_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.ceiling(1), Duration::from_millis(100));
        assert_eq!(policy.ceiling(2), Duration::from_millis(200));
        assert_eq!(policy.ceiling(4), Duration::from_millis(800));
        assert_eq!(policy.ceiling(5), Duration::from_secs(1));
        assert_eq!(policy.ceiling(64), Duration::from_secs(1));
    }

    #[test]
    fn test_delay_within_jitter_bounds() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(5));
        for attempt in 1..=5 {
            let ceiling = policy.ceiling(attempt);
            for _ in 0..20 {
                let delay = policy.delay(attempt);
                assert!(delay >= ceiling / 2, "{:?} < {:?}", delay, ceiling / 2);
                assert!(delay <= ceiling, "{:?} > {:?}", delay, ceiling);
            }
        }
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(fast_policy(0).max_attempts(), 1);
        assert_eq!(fast_policy(3).max_attempts(), 4);
        assert_eq!(fast_policy(u32::MAX).max_attempts(), u32::MAX);
    }

    #[tokio::test]
    async fn test_with_retry_success() {
        let result = with_retry("test", &fast_policy(3), || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_retry_immediate_failure_on_client_error() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<i32> = with_retry("test", &fast_policy(3), || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(server_error(404))
            }
        })
        .await;

        assert!(matches!(result, Err(NenDBError::Server { status: 404, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_retries_on_network_error() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result = with_retry("test", &fast_policy(3), || {
            let attempts = Arc::clone(&attempts);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(NenDBError::connection("attempt failed", "connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<i32> = with_retry("test", &fast_policy(2), || {
            let attempts = Arc::clone(&attempts);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                Err(NenDBError::connection(
                    "attempt failed",
                    format!("connection reset #{}", count + 1),
                ))
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(matches!(err, NenDBError::Connection { .. }));
        // The final cause is the one from the last attempt
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("connection reset #3".to_string())
        );
    }

    #[tokio::test]
    async fn test_with_retry_surfaces_last_server_error() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<i32> = with_retry("test", &fast_policy(1), || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(server_error(503))
            }
        })
        .await;

        assert!(matches!(result, Err(NenDBError::Server { status: 503, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_zero_retries_single_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));

        let result: Result<i32> = with_retry("test", &fast_policy(0), || {
            let attempts = Arc::clone(&attempts);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(NenDBError::connection("attempt failed", "refused"))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
