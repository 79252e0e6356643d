use std::fmt;

use crate::error::{ManifestError, Result};

/// The drop sub-tree to materialize, normalized to `/segment/.../`.
///
/// Backslashes become forward slashes and a leading and trailing `/` are
/// ensured, so `bin\x64` and `/bin/x64/` name the same root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RootPrefix(String);

impl RootPrefix {
    pub fn new(raw: &str) -> Self {
        let mut root = raw.replace('\\', "/");
        if !root.starts_with('/') {
            root.insert(0, '/');
        }
        if !root.ends_with('/') {
            root.push('/');
        }
        Self(root)
    }

    pub fn as_str(&self) -> &str { &self.0 }

    pub fn contains(&self, path: &str) -> bool { path.starts_with(&self.0) }

    /// The part of `path` below this root.
    pub fn relative<'a>(&self, path: &'a str) -> Result<&'a str> {
        path.strip_prefix(self.0.as_str())
            .ok_or_else(|| ManifestError::OutsideRoot {
                path: path.to_string(),
                root: self.0.clone(),
            })
    }
}

impl Default for RootPrefix {
    fn default() -> Self { Self::new("/") }
}

impl fmt::Display for RootPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}
