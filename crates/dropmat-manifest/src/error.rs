//! Error types for dropmat-manifest.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("invalid drop URL '{url}': {source}")]
    Parse {
        url:    String,
        #[source]
        source: url::ParseError,
    },

    #[error("'{0}' is not a drop endpoint (no drop/drops segment)")]
    NotADropEndpoint(String),
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("drop manifest is empty")]
    Empty,

    #[error("path '{path}' does not start with root '{root}'")]
    OutsideRoot { path: String, root: String },

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("manifest request failed: {0}")]
    Request(String),

    #[error("manifest request returned HTTP {0}")]
    Status(u16),

    #[error("failed to decode manifest: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
