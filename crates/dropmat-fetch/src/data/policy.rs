use std::time::Duration;

use crate::core::retry_delay;

/// Total attempts per blob, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Base of the exponential backoff. Retry `k` waits `base * 2^k`.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on a single transfer attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Retry configuration for a [`Fetcher`](crate::Fetcher).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dropmat_fetch::RetryPolicy;
///
/// let policy = RetryPolicy::default()
///     .max_attempts(3)
///     .attempt_timeout(Duration::from_secs(30));
///
/// assert_eq!(policy.delay_before_retry(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_before_retry(2), Duration::from_secs(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total. Never below one.
    pub max_attempts:    u32,

    /// Backoff base; the delay before retry `k` is `base_delay * 2^k`.
    pub base_delay:      Duration,

    /// Timeout applied to every attempt independently.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts:    DEFAULT_MAX_ATTEMPTS,
            base_delay:      DEFAULT_BASE_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Delay to wait before retry number `retry` (1 = the retry after the
    /// first failed attempt).
    pub fn delay_before_retry(&self, retry: u32) -> Duration { retry_delay(retry, self.base_delay) }
}
