//! Run configuration.

use dropmat_manifest::{RootPrefix, parse_drop_url, root_filter};
use url::Url;

use crate::error::ConfigError;

/// Groups processed at the same time.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Knobs for a [`Materializer`](crate::Materializer) run.
///
/// # Examples
///
/// ```
/// use dropmat::MaterializeOptions;
///
/// let options = MaterializeOptions::default().concurrency(8);
/// assert_eq!(options.concurrency, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Upper bound on dedup groups in flight. Never below one.
    pub concurrency: usize,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl MaterializeOptions {
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// A drop to materialize: its endpoint and the sub-tree to take from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropSource {
    pub url:  Url,
    pub root: RootPrefix,
}

impl DropSource {
    /// Parse `drop_url`. An explicit `root` wins over the URL's `?root=`
    /// parameter; one of the two is required.
    pub fn parse(drop_url: &str, root: Option<&str>) -> Result<Self, ConfigError> {
        let url = parse_drop_url(drop_url)?;
        let root = match root {
            Some(root) => root.to_string(),
            None => root_filter(&url).ok_or(ConfigError::MissingRoot)?,
        };

        Ok(Self {
            url,
            root: RootPrefix::new(&root),
        })
    }
}
