use std::future::Future;

use tracing::{debug, info};
use url::Url;

use crate::data::{Manifest, ManifestEntry};
use crate::endpoint::{MANIFEST_API_VERSION, manifest_endpoint};
use crate::error::Result;
use crate::root::RootPrefix;

/// Source of the full entry list behind a manifest endpoint.
pub trait ManifestProvider: Send + Sync {
    fn entries(&self, endpoint: &Url) -> impl Future<Output = Result<Vec<ManifestEntry>>> + Send;
}

/// Resolve the manifest of `drop` and keep the entries under `root`.
///
/// Fails on any provider error and on an empty result; no partial manifest
/// is ever returned.
pub async fn load_manifest<P: ManifestProvider>(
    provider: &P,
    drop: &Url,
    root: &RootPrefix,
) -> Result<Manifest> {
    let endpoint = manifest_endpoint(drop, MANIFEST_API_VERSION)?;
    debug!(endpoint = %endpoint, "requesting drop manifest");

    let entries = provider.entries(&endpoint).await?;
    let total = entries.len();
    let entries: Vec<ManifestEntry> = entries
        .into_iter()
        .filter(|entry| root.contains(&entry.path))
        .collect();

    info!(total, kept = entries.len(), root = %root, "loaded drop manifest");
    Manifest::new(entries)
}

#[cfg(feature = "reqwest")]
mod rest {
    use std::fmt;

    use reqwest::Client;

    use super::*;
    use crate::endpoint::BLOB_API_VERSION;
    use crate::error::ManifestError;

    pub const BLOB_API_VERSION_HEADER: &str = "x-blob-api-version";

    /// Manifest provider for the drop REST API.
    ///
    /// Authenticates with a personal access token as the basic-auth password.
    #[derive(Clone)]
    pub struct RestManifestProvider {
        client: Client,
        token:  Option<String>,
    }

    impl RestManifestProvider {
        pub fn new(token: Option<String>) -> Result<Self> {
            let client = Client::builder()
                .build()
                .map_err(|e| ManifestError::Request(e.to_string()))?;
            Ok(Self::from_client(client, token))
        }

        pub fn from_client(client: Client, token: Option<String>) -> Self { Self { client, token } }
    }

    impl fmt::Debug for RestManifestProvider {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("RestManifestProvider")
                .field("token", &self.token.as_ref().map(|_| "<redacted>"))
                .finish()
        }
    }

    impl ManifestProvider for RestManifestProvider {
        async fn entries(&self, endpoint: &Url) -> Result<Vec<ManifestEntry>> {
            let mut request = self
                .client
                .get(endpoint.clone())
                .header(BLOB_API_VERSION_HEADER, BLOB_API_VERSION);
            if let Some(token) = &self.token {
                request = request.basic_auth("", Some(token));
            }

            let response = request
                .send()
                .await
                .map_err(|e| ManifestError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ManifestError::Status(status.as_u16()));
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| ManifestError::Request(e.to_string()))?;

            Ok(serde_json::from_slice(&body)?)
        }
    }
}

#[cfg(feature = "reqwest")]
pub use rest::{BLOB_API_VERSION_HEADER, RestManifestProvider};
