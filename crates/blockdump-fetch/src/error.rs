//! Error types for blockdump-fetch.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// A payload that parsed but cannot be stored for the requested height.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("height mismatch: got {found} expected {expected}")]
    HeightMismatch { expected: u64, found: Value },
}

pub type Result<T> = std::result::Result<T, FetchError>;
