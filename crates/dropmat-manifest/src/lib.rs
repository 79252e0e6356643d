//! Drop manifests: the entry model, root filtering, manifest endpoint
//! derivation and the REST provider that loads them.

mod data;
mod endpoint;
mod error;
mod provider;
mod root;

pub use data::{ContentBlob, Manifest, ManifestEntry};
pub use endpoint::{
    API_VERSION_PARAM, BLOB_API_VERSION, MANIFEST_API_VERSION, ROOT_PARAM, manifest_endpoint,
    parse_drop_url, root_filter,
};
pub use error::{EndpointError, ManifestError, Result};
pub use provider::{ManifestProvider, load_manifest};
pub use root::RootPrefix;

#[cfg(feature = "reqwest")]
pub use provider::{BLOB_API_VERSION_HEADER, RestManifestProvider};
