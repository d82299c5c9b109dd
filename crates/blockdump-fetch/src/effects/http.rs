use std::future::Future;

use bytes::Bytes;

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body:   Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Asynchronous HTTP client abstraction.
///
/// This trait provides the minimal interface needed for block fetching.
/// Implementations handle connection pooling and error mapping; the
/// per-request timeout is enforced by the caller.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Scripted implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + 'static;

    /// Issue `GET url` with `Accept: application/json` and read the whole body.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_client {
    use super::*;
    use crate::data::FetchOptions;
    use crate::error::FetchError;
    use reqwest::Client;
    use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

    /// Production HTTP client implementation using reqwest.
    pub struct ReqwestClient {
        client: Client,
    }

    impl ReqwestClient {
        pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

            let client = Client::builder()
                .default_headers(headers)
                .user_agent(options.user_agent.clone())
                .timeout(options.timeout)
                .pool_max_idle_per_host(options.max_connections)
                .build()
                .map_err(|e| FetchError::Client(e.to_string()))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> Result<HttpResponse, Self::Error> {
            let response = self.client.get(url).send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok(HttpResponse { status, body })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;
