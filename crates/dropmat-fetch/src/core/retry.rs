use std::time::Duration;

use crate::error::FetchError;

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dropmat_fetch::retry_delay;
///
/// // First retry: base * 2^1
/// assert_eq!(retry_delay(1, Duration::from_secs(1)), Duration::from_secs(2));
///
/// // Third retry: base * 2^3
/// assert_eq!(retry_delay(3, Duration::from_secs(1)), Duration::from_secs(8));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    // Use saturating_pow to prevent overflow
    let multiplier = 2_u32.saturating_pow(retry_count);

    base.saturating_mul(multiplier)
}

/// Whether a failed attempt is worth repeating.
///
/// Transport failures (connect, socket, body stream), timeouts, server-side
/// 5xx responses and local write errors are transient. Client rejections,
/// malformed URLs, permission problems, a pre-existing destination and
/// cancellation are not.
pub fn is_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Connect(_)
        | FetchError::Network(_)
        | FetchError::Timeout
        | FetchError::Io(_) => true,
        FetchError::Status(code) => (500..600).contains(code),
        FetchError::InvalidUrl(_)
        | FetchError::PermissionDenied(_)
        | FetchError::DestinationExists(_)
        | FetchError::Cancelled
        | FetchError::RetriesExhausted { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_basic() {
        let base = Duration::from_millis(100);

        assert_eq!(retry_delay(0, base), Duration::from_millis(100));
        assert_eq!(retry_delay(1, base), Duration::from_millis(200));
        assert_eq!(retry_delay(2, base), Duration::from_millis(400));
        assert_eq!(retry_delay(3, base), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_delay_zero_base() {
        let base = Duration::ZERO;

        assert_eq!(retry_delay(1, base), Duration::ZERO);
        assert_eq!(retry_delay(10, base), Duration::ZERO);
    }

    #[test]
    fn test_retry_delay_overflow_protection() {
        let base = Duration::from_secs(u64::MAX / 2);

        let delay = retry_delay(40, base);
        assert!(delay > Duration::from_secs(0));
    }

    #[test]
    fn test_retry_delay_strictly_increasing() {
        let base = Duration::from_secs(1);
        let delays: Vec<Duration> = (1..10).map(|k| retry_delay(k, base)).collect();

        for pair in delays.windows(2) {
            assert!(pair[1] > pair[0]);
            assert_eq!(pair[1], pair[0] * 2);
        }
    }

    #[test]
    fn test_transient_errors_are_retryable() {
        assert!(is_retryable(&FetchError::Timeout));
        assert!(is_retryable(&FetchError::Connect("refused".into())));
        assert!(is_retryable(&FetchError::Network("reset by peer".into())));
        assert!(is_retryable(&FetchError::Status(503)));
        assert!(is_retryable(&FetchError::Io(dropmat_fs::Error::Io {
            path:   "x".into(),
            source: std::io::Error::other("disk full"),
        })));
    }

    #[test]
    fn test_terminal_errors_are_not_retryable() {
        assert!(!is_retryable(&FetchError::Status(403)));
        assert!(!is_retryable(&FetchError::Status(404)));
        assert!(!is_retryable(&FetchError::InvalidUrl("nope".into())));
        assert!(!is_retryable(&FetchError::PermissionDenied("x".into())));
        assert!(!is_retryable(&FetchError::DestinationExists("x".into())));
        assert!(!is_retryable(&FetchError::Cancelled));
    }
}
