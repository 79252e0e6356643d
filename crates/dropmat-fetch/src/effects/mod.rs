//! I/O side of fetching: the HTTP client seam and the retrying fetcher.

mod fetcher;
mod http;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
