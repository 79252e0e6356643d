use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn path(&self) -> &Path {
        match self {
            Error::NotFound(path) | Error::PermissionDenied(path) | Error::AlreadyExists(path) => {
                path
            }
            Error::Io { path, .. } => path,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Error::NotFound(_) => io::ErrorKind::NotFound,
            Error::PermissionDenied(_) => io::ErrorKind::PermissionDenied,
            Error::AlreadyExists(_) => io::ErrorKind::AlreadyExists,
            Error::Io { source, .. } => source.kind(),
        }
    }
}

/// Attach `path` to an I/O error, folding the kinds callers branch on into
/// dedicated variants.
pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Error {
    let path = path.into();
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path),
        io::ErrorKind::PermissionDenied => Error::PermissionDenied(path),
        io::ErrorKind::AlreadyExists => Error::AlreadyExists(path),
        _ => Error::Io { path, source: err },
    }
}
