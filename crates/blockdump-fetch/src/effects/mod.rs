//! I/O side of fetching: the HTTP seam and the block fetcher built on it.

mod fetcher;
mod http;

pub use fetcher::{BlockFetcher, FetchOutcome, block_url, truncate};
pub use http::{HttpClient, HttpResponse};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
