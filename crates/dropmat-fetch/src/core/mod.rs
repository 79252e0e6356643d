//! Pure transformations for fetching: backoff arithmetic, the retry
//! predicate and locator redaction.

mod locator;
mod retry;

pub use locator::redact_locator;
pub use retry::{is_retryable, retry_delay};
