//! Retry handling with exponential backoff and jitter
//!
//! Wraps any fallible async operation with bounded retries. The module has
//! no dependency on fetch types: an error opts in by implementing
//! [`Retryable`], so the same policy drives network fetches, tool calls, or
//! anything else that wants backoff.

use rand::Rng;
use serde::Deserialize;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Message fragments that mark an error as transient
///
/// Matched case-insensitively against the error's display string when no
/// structured classification is available.
const TRANSIENT_PATTERNS: &[&str] = &[
    "timeout",
    "connection",
    "network",
    "temporary",
    "service unavailable",
    "502",
    "503",
    "504",
    "rate limit",
    "too many requests",
];

/// Checks whether an error message looks like a transient failure
///
/// # Examples
///
/// ```
/// use driftnet::retry::transient_error_message;
///
/// assert!(transient_error_message("connection reset by peer"));
/// assert!(transient_error_message("HTTP 503 Service Unavailable"));
/// assert!(!transient_error_message("404 not found"));
/// ```
pub fn transient_error_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Classification hooks for errors passed through [`with_retry`]
///
/// `retry_after` lets an error carry an explicit delay hint (e.g. from a
/// Retry-After header); when present it replaces the computed backoff,
/// still capped at the policy's maximum delay.
pub trait Retryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;

    /// Explicit delay requested by the failure, if any
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryPolicy {
    /// Total attempts, including the first (1 = no retries)
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,

    /// Multiplier applied to the delay after each failed attempt
    pub backoff_factor: f64,

    /// Cap on any single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            backoff_factor: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the total attempt budget
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay in milliseconds
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay in milliseconds
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff multiplier
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Calculates the delay after a failed attempt (1-based)
    ///
    /// An explicit `retry_after` hint wins over the computed backoff.
    /// Otherwise: `base_delay * backoff_factor^(attempt - 1)`, jittered by
    /// ±25% to avoid synchronized retry storms. Either path is capped at
    /// `max_delay_ms`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let max_delay = Duration::from_millis(self.max_delay_ms);

        if let Some(hint) = retry_after {
            return hint.min(max_delay);
        }

        let exponent = attempt.saturating_sub(1);
        let raw = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent as i32);

        // ±25% jitter
        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        let jittered = (raw * jitter).max(0.0);

        Duration::from_millis(jittered as u64).min(max_delay)
    }
}

/// Executes an operation with bounded retries and exponential backoff
///
/// Non-retryable errors are returned immediately on first occurrence.
/// Retryable errors are re-attempted up to `policy.max_attempts` total
/// attempts; the last error is returned once the budget is exhausted.
///
/// # Examples
///
/// ```no_run
/// use driftnet::retry::{with_retry, RetryPolicy};
/// use driftnet::FetchError;
///
/// # async fn example() -> Result<String, FetchError> {
/// let policy = RetryPolicy::new().with_max_attempts(4);
/// with_retry(&policy, "fetch homepage", || async {
///     Err(FetchError::Timeout { url: "https://example.com/".into() })
/// })
/// .await
/// # }
/// ```
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        tracing::debug!(
            "Attempting {} (attempt {}/{})",
            operation_name,
            attempt,
            max_attempts
        );

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                if !e.is_retryable() {
                    tracing::warn!("{} failed with non-retryable error: {}", operation_name, e);
                    return Err(e);
                }

                if attempt >= max_attempts {
                    tracing::warn!(
                        "{} failed after {} attempts: {}",
                        operation_name,
                        attempt,
                        e
                    );
                    return Err(e);
                }

                let delay = policy.delay_for(attempt, e.retry_after());
                tracing::warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {:?}",
                    operation_name,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    unreachable!("retry loop returns from within")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("transient failure")]
        Transient,
        #[error("fatal failure")]
        Fatal,
        #[error("slow down")]
        Hinted(Duration),
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            !matches!(self, TestError::Fatal)
        }

        fn retry_after(&self) -> Option<Duration> {
            match self {
                TestError::Hinted(d) => Some(*d),
                _ => None,
            }
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_base_delay_ms(1)
            .with_max_delay_ms(5)
    }

    #[test]
    fn test_transient_patterns() {
        assert!(transient_error_message("Request TIMEOUT after 30s"));
        assert!(transient_error_message("network unreachable"));
        assert!(transient_error_message("got 502 from upstream"));
        assert!(transient_error_message("Too Many Requests"));
        assert!(!transient_error_message("invalid certificate name"));
        assert!(!transient_error_message("404"));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.max_delay_ms, 60_000);
    }

    #[test]
    fn test_delay_grows_exponentially_within_jitter() {
        let policy = RetryPolicy::new()
            .with_base_delay_ms(100)
            .with_backoff_factor(2.0)
            .with_max_delay_ms(60_000);

        // attempt 1 -> ~100ms, attempt 3 -> ~400ms, each within ±25%
        let d1 = policy.delay_for(1, None).as_millis() as f64;
        assert!((75.0..=125.0).contains(&d1), "got {}", d1);

        let d3 = policy.delay_for(3, None).as_millis() as f64;
        assert!((300.0..=500.0).contains(&d3), "got {}", d3);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy::new()
            .with_base_delay_ms(1000)
            .with_max_delay_ms(2000);

        let delay = policy.delay_for(10, None);
        assert!(delay <= Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_after_overrides_backoff() {
        let policy = RetryPolicy::new().with_base_delay_ms(1);
        let delay = policy.delay_for(1, Some(Duration::from_millis(700)));
        assert_eq!(delay, Duration::from_millis(700));
    }

    #[test]
    fn test_retry_after_capped_at_max() {
        let policy = RetryPolicy::new().with_max_delay_ms(500);
        let delay = policy.delay_for(1, Some(Duration::from_secs(60)));
        assert_eq!(delay, Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, TestError> = with_retry(&fast_policy(3), "op", || {
            let c = calls_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_success_after_k_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        // Fails twice, succeeds on the third call; budget allows it
        let result: Result<i32, TestError> = with_retry(&fast_policy(5), "op", || {
            let c = calls_clone.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, TestError> = with_retry(&fast_policy(3), "op", || {
            let c = calls_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result.unwrap_err(), TestError::Transient));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, TestError> = with_retry(&fast_policy(5), "op", || {
            let c = calls_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            }
        })
        .await;

        assert!(matches!(result.unwrap_err(), TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hinted_delay_used() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let start = std::time::Instant::now();
        let result: Result<i32, TestError> = with_retry(&fast_policy(2), "op", || {
            let c = calls_clone.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError::Hinted(Duration::from_millis(5)))
                } else {
                    Ok(1)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_zero_attempts_coerced_to_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let result: Result<i32, TestError> = with_retry(&fast_policy(0), "op", || {
            let c = calls_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
