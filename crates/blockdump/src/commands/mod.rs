pub mod download;
pub mod merge;
pub mod tx;

/// Bad input detected by a command itself; exits with status 2.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UsageError(pub String);
