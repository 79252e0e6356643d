//! Error types for dropmat-fetch.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("file I/O error: {0}")]
    Io(#[source] dropmat_fs::Error),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("max retries exceeded ({attempts} attempts): {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source:   Box<FetchError>,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

impl FetchError {
    /// The error that ended the last attempt, looking through
    /// [`FetchError::RetriesExhausted`].
    pub fn last_error(&self) -> &FetchError {
        match self {
            FetchError::RetriesExhausted { source, .. } => source.last_error(),
            other => other,
        }
    }
}

impl From<dropmat_fs::Error> for FetchError {
    fn from(e: dropmat_fs::Error) -> Self {
        match e {
            dropmat_fs::Error::AlreadyExists(path) => FetchError::DestinationExists(path),
            dropmat_fs::Error::PermissionDenied(path) => FetchError::PermissionDenied(path),
            other => FetchError::Io(other),
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}
