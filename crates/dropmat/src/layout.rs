//! Mapping of manifest paths onto the local destination tree.

use std::path::{Path, PathBuf};

use dropmat_manifest::{ManifestError, RootPrefix};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PathError {
    #[error(transparent)]
    OutsideRoot(#[from] ManifestError),

    #[error("path '{0}' names no file below the root")]
    Empty(String),

    #[error("path '{0}' escapes the destination directory")]
    ParentTraversal(String),
}

/// Resolve `manifest_path` under `destination_root`.
///
/// The root prefix is stripped, the remainder is split on both `/` and `\`
/// and rebuilt with native separators. Empty and `.` segments are skipped;
/// `..` segments are rejected.
pub fn local_path(
    destination_root: &Path,
    root: &RootPrefix,
    manifest_path: &str,
) -> Result<PathBuf, PathError> {
    let relative = root.relative(manifest_path)?;

    let mut resolved = destination_root.to_path_buf();
    let mut depth = 0usize;
    for segment in relative.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::ParentTraversal(manifest_path.to_string())),
            segment => {
                resolved.push(segment);
                depth += 1;
            }
        }
    }

    if depth == 0 {
        return Err(PathError::Empty(manifest_path.to_string()));
    }
    Ok(resolved)
}
