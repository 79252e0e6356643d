//! Local reproduction of a fetched blob at its sibling paths.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::ReplicationError;

/// Copy `source` to every path in `destinations`, in order.
///
/// Parent directories are created as needed. An existing destination or a
/// missing source fails the whole call; nothing is retried.
pub fn replicate(source: &Path, destinations: &[PathBuf]) -> Result<Duration, ReplicationError> {
    let start = Instant::now();

    for destination in destinations {
        dropmat_fs::ensure_parent(destination).map_err(|e| copy_error(source, destination, e))?;
        let bytes = dropmat_fs::copy_new(source, destination)
            .map_err(|e| copy_error(source, destination, e))?;
        trace!(from = %source.display(), to = %destination.display(), bytes, "replicated");
    }

    Ok(start.elapsed())
}

fn copy_error(source: &Path, destination: &Path, err: dropmat_fs::Error) -> ReplicationError {
    match err {
        dropmat_fs::Error::AlreadyExists(path) if path == destination => {
            ReplicationError::DestinationExists(path)
        }
        dropmat_fs::Error::NotFound(path) if path == source => ReplicationError::SourceMissing(path),
        err => ReplicationError::Copy {
            from:   source.to_path_buf(),
            to:     destination.to_path_buf(),
            source: err,
        },
    }
}
