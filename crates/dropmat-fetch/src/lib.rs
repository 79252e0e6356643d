//! HTTP fetching of a single content blob with bounded retry.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration ([`RetryPolicy`])
//! - [`core`] - Pure transformations (backoff, retry predicate)
//! - [`effects`] - I/O operations with trait abstraction ([`HttpClient`], [`Fetcher`])
//!
//! # Key Features
//!
//! - **No-Clobber Writes**: Every attempt creates the destination fresh and
//!   never replaces a file it did not write
//! - **Cleanup On Failure**: Partial output is deleted before the next attempt
//!   and after the last one
//! - **Explicit Retry Predicate**: [`is_retryable`] decides which
//!   [`FetchError`]s are transient
//! - **Cancellable**: In-flight attempts and backoff sleeps stop on a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use crate::core::{is_retryable, redact_locator, retry_delay};
pub use data::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
pub use effects::{BoxStream, Fetcher, HttpClient};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result};
