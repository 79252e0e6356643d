//! No-clobber filesystem primitives.
//!
//! Every write here refuses to replace an existing file: a path that is
//! already present is reported as [`Error::AlreadyExists`] and left as it
//! was.

mod error;

pub use error::{Error, Result, from_io};

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Create every missing ancestor directory of `path`.
pub fn ensure_parent(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| from_io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Open a fresh file for writing, failing if `path` already exists.
pub fn create_new(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| from_io(path, e))
}

/// Copy `src` to `dest` byte for byte without overwriting `dest`.
///
/// A copy that fails after `dest` was created removes the partial file.
pub fn copy_new(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<u64> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    let mut reader = File::open(src).map_err(|e| from_io(src, e))?;
    let mut writer = create_new(dest)?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.sync_all().map(|()| n));
    match copied {
        Ok(n) => Ok(n),
        Err(e) => {
            drop(writer);
            let _ = remove_partial(dest);
            Err(from_io(dest, e))
        }
    }
}

/// Remove a partially written file. Returns whether anything was removed.
pub fn remove_partial(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(from_io(path, e)),
    }
}
