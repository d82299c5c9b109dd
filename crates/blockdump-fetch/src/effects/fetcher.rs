use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::Payload;
use crate::data::ERROR_BODY_LIMIT;
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

/// Classified result of a single GET.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 200 with a body that parsed as JSON.
    Payload { status: u16, payload: Payload },
    /// Any other status; `message` carries a truncated body.
    Http { status: u16, message: String },
    /// DNS, connect, reset, timeout, or an unparseable body.
    Transport { message: String },
    /// Cancellation was requested while the request was in flight.
    Aborted,
}

impl FetchOutcome {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FetchOutcome::Payload { status, .. } | FetchOutcome::Http { status, .. } => Some(*status),
            FetchOutcome::Transport { .. } | FetchOutcome::Aborted => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchOutcome::Http { message, .. } | FetchOutcome::Transport { message } => Some(message),
            FetchOutcome::Payload { .. } | FetchOutcome::Aborted => None,
        }
    }
}

pub fn block_url(base_url: &str, height: u64) -> String {
    format!("{}/api/block/{height}", base_url.trim_end_matches('/'))
}

/// Fetches one block per call from `{base_url}/api/block/{height}`.
pub struct BlockFetcher<C: HttpClient> {
    client:   C,
    base_url: String,
    timeout:  Duration,
}

impl<C: HttpClient> BlockFetcher<C> {
    pub fn new(client: C, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let trimmed = base_url.trim();
        if trimmed.is_empty() || !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(FetchError::InvalidUrl(base_url));
        }
        Ok(Self {
            client,
            base_url: trimmed.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, height: u64) -> String {
        block_url(&self.base_url, height)
    }

    pub async fn fetch(&self, height: u64, cancel: &CancellationToken) -> FetchOutcome {
        self.fetch_url(&self.url_for(height), cancel).await
    }

    pub async fn fetch_url(&self, url: &str, cancel: &CancellationToken) -> FetchOutcome {
        let request = tokio::time::timeout(self.timeout, self.client.get(url));
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FetchOutcome::Aborted,
            response = request => response,
        };

        let response = match response {
            Err(_) => {
                return FetchOutcome::Transport {
                    message: format!("request timed out after {}s", self.timeout.as_secs_f64()),
                };
            }
            Ok(Err(e)) => {
                return FetchOutcome::Transport {
                    message: error_chain(&e),
                };
            }
            Ok(Ok(response)) => response,
        };
        tracing::trace!(url, status = response.status, bytes = response.body.len(), "response");

        if response.status != 200 {
            let text = String::from_utf8_lossy(&response.body);
            return FetchOutcome::Http {
                status:  response.status,
                message: format!("HTTP {}: {}", response.status, truncate(&text, ERROR_BODY_LIMIT)),
            };
        }

        match serde_json::from_slice::<serde_json::Value>(&response.body) {
            Ok(value) => FetchOutcome::Payload {
                status:  response.status,
                payload: Payload::from(value),
            },
            Err(e) => FetchOutcome::Transport {
                message: format!("invalid JSON body: {e}"),
            },
        }
    }
}

/// Keep at most `limit` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
