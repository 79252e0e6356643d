use std::path::Path;
use std::time::{Duration, Instant};

use futures_util::TryStreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::{is_retryable, redact_locator};
use crate::data::RetryPolicy;
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Downloads one blob to one local path, retrying transient failures.
pub struct Fetcher<C: HttpClient> {
    pub(crate) client: C,
    policy:            RetryPolicy,
}

impl<C: HttpClient> Fetcher<C> {
    /// Create a new fetcher with the provided HTTP client and the default
    /// [`RetryPolicy`].
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy { &self.policy }

    pub fn client(&self) -> &C { &self.client }

    /// Fetch `url` into a new file at `destination`.
    ///
    /// Missing parent directories are created. Every attempt writes a fresh
    /// file; whatever an attempt wrote is deleted when it fails, so a
    /// terminal error leaves nothing behind. A destination that exists
    /// before the first attempt is left untouched and reported as
    /// [`FetchError::DestinationExists`].
    ///
    /// Returns the wall time spent, backoff included.
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        let start = Instant::now();
        let locator = redact_locator(url);

        dropmat_fs::ensure_parent(destination)?;

        let mut attempt = 1;
        loop {
            let mut created = false;
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => Err(FetchError::Cancelled),
                result = tokio::time::timeout(
                    self.policy.attempt_timeout,
                    self.attempt(url, destination, &mut created),
                ) => result.unwrap_or(Err(FetchError::Timeout)),
            };

            let err = match outcome {
                Ok(bytes) => {
                    let elapsed = start.elapsed();
                    info!(
                        locator,
                        destination = %destination.display(),
                        bytes,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "downloaded blob"
                    );
                    return Ok(elapsed);
                }
                Err(err) => err,
            };

            if created {
                self.discard_partial(destination);
            }

            if matches!(err, FetchError::Cancelled) {
                debug!(locator, destination = %destination.display(), "fetch cancelled");
                return Err(err);
            }

            if !is_retryable(&err) {
                error!(locator, destination = %destination.display(), attempt, error = %err, "fetch failed");
                return Err(err);
            }

            if attempt >= self.policy.max_attempts {
                error!(
                    locator,
                    destination = %destination.display(),
                    attempts = attempt,
                    error = %err,
                    "fetch retries exhausted"
                );
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt,
                    source:   Box::new(err),
                });
            }

            let delay = self.policy.delay_before_retry(attempt);
            warn!(
                locator,
                destination = %destination.display(),
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "fetch attempt failed, retrying"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(FetchError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// One transfer. Sets `created` once the destination file is ours, so
    /// the caller knows whether a failure left a partial file to remove.
    async fn attempt(&self, url: &str, destination: &Path, created: &mut bool) -> Result<u64> {
        let mut stream = self.client.stream(url).await.map_err(Into::<FetchError>::into)?;

        let file = dropmat_fs::create_new(destination)?;
        *created = true;
        let mut file = tokio::fs::File::from_std(file);

        let mut bytes_written = 0u64;
        while let Some(chunk) = stream.try_next().await.map_err(Into::<FetchError>::into)? {
            file.write_all(&chunk)
                .await
                .map_err(|e| dropmat_fs::from_io(destination, e))?;
            bytes_written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| dropmat_fs::from_io(destination, e))?;
        file.sync_all()
            .await
            .map_err(|e| dropmat_fs::from_io(destination, e))?;

        Ok(bytes_written)
    }

    fn discard_partial(&self, destination: &Path) {
        if let Err(e) = dropmat_fs::remove_partial(destination) {
            warn!(destination = %destination.display(), error = %e, "failed to remove partial download");
        }
    }
}
