//! Drop URL handling: parsing, the `root` filter and the manifest endpoint.

use url::Url;

use crate::error::EndpointError;

/// API version requested from the manifest endpoint.
pub const MANIFEST_API_VERSION: &str = "2.0-preview";

/// API version of the blob locators the manifest hands out.
pub const BLOB_API_VERSION: &str = "2.1-preview";

pub const API_VERSION_PARAM: &str = "api-version";

pub const ROOT_PARAM: &str = "root";

const DROPS_SEGMENT: &str = "drop/drops";
const MANIFESTS_SEGMENT: &str = "drop/manifests";

pub fn parse_drop_url(raw: &str) -> Result<Url, EndpointError> {
    Url::parse(raw).map_err(|source| EndpointError::Parse {
        url: raw.to_string(),
        source,
    })
}

/// The `root` query parameter of a drop URL, if present and non-empty.
pub fn root_filter(drop: &Url) -> Option<String> {
    drop.query_pairs()
        .find(|(key, _)| key == ROOT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Derive the manifest endpoint of a drop.
///
/// `drop/drops` in the path becomes `drop/manifests`. Scheme, host and the
/// remaining path are kept; an explicit port, credentials and the fragment
/// are dropped. Query pairs other than `root` and `api-version` are kept and
/// `api-version` is set to `api_version`.
pub fn manifest_endpoint(drop: &Url, api_version: &str) -> Result<Url, EndpointError> {
    if !drop.path().contains(DROPS_SEGMENT) {
        return Err(EndpointError::NotADropEndpoint(drop.to_string()));
    }

    let retained: Vec<(String, String)> = drop
        .query_pairs()
        .filter(|(key, _)| key != API_VERSION_PARAM && key != ROOT_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut endpoint = drop.clone();
    endpoint.set_path(&drop.path().replace(DROPS_SEGMENT, MANIFESTS_SEGMENT));
    endpoint.set_fragment(None);
    endpoint.set_query(None);
    // These only fail on URLs that cannot carry a port or credentials,
    // which leaves nothing to strip.
    let _ = endpoint.set_port(None);
    let _ = endpoint.set_username("");
    let _ = endpoint.set_password(None);

    endpoint
        .query_pairs_mut()
        .extend_pairs(retained)
        .append_pair(API_VERSION_PARAM, api_version);

    Ok(endpoint)
}
