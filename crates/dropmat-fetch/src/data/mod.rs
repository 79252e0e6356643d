//! Immutable configuration for fetch operations.

pub mod policy;

pub use policy::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
