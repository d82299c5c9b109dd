use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("txid must be 64 hex characters, got {0:?}")]
    InvalidTxid(String),

    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {addr} timed out after {}s", .after.as_secs_f64())]
    ConnectTimeout { addr: String, after: Duration },

    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no response within {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("server closed the connection")]
    Closed,

    #[error("response exceeds {0} bytes")]
    TooLarge(usize),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        line:   String,
    },

    #[error("{method} failed: {error}")]
    Server { method: String, error: Value },

    #[error("expected a {expected} result")]
    UnexpectedShape { expected: &'static str, result: Value },
}

pub type Result<T> = std::result::Result<T, RpcError>;
