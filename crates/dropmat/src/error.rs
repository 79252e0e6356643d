//! Error types for the materialization engine.

use std::path::PathBuf;

use dropmat_fetch::FetchError;
use dropmat_manifest::{EndpointError, ManifestError};
use thiserror::Error;

use crate::engine::RunState;
use crate::layout::PathError;

#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("replica already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("replication source missing: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from:   PathBuf,
        to:     PathBuf,
        #[source]
        source: dropmat_fs::Error,
    },
}

/// Failures while setting up a run. Nothing has been written when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("drop URL has no root filter; pass one explicitly or add ?root= to the URL")]
    MissingRoot,

    #[error("not able to load the drop manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] FetchError),
}

#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("failed to fetch blob {blob}: {source}")]
    Fetch {
        blob:   String,
        #[source]
        source: FetchError,
    },

    #[error("failed to replicate blob {blob}: {source}")]
    Replicate {
        blob:   String,
        #[source]
        source: ReplicationError,
    },

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("materialization cancelled with {remaining} of {total} blobs outstanding")]
    Cancelled { remaining: usize, total: usize },

    #[error("materialization already ran (state: {0})")]
    AlreadyRun(RunState),
}

pub type Result<T> = std::result::Result<T, MaterializeError>;
