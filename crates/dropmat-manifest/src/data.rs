use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};

/// Content addressed by an opaque identity plus a short-lived locator.
///
/// Two blobs with the same `id` have identical bytes. The `url` is issued
/// by the drop service and is only guaranteed to stay valid for one run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentBlob {
    pub id:  String,
    pub url: String,
}

impl ContentBlob {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id:  id.into(),
            url: url.into(),
        }
    }
}

/// A drop path bound to the blob holding its bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub blob: ContentBlob,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>, blob: ContentBlob) -> Self {
        Self {
            path: path.into(),
            blob,
        }
    }
}

/// Immutable, non-empty snapshot of a drop's file list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Fails with [`ManifestError::Empty`] when `entries` is empty.
    pub fn new(entries: Vec<ManifestEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(ManifestError::Empty);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ManifestEntry] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    /// Always `false`; kept for API symmetry with [`Manifest::len`].
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> { self.entries.iter() }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}
