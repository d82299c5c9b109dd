use std::path::PathBuf;

use thiserror::Error;

/// Invalid run parameters; raised before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("start height {start} is greater than end height {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("retries must be at least 1")]
    ZeroRetries,

    #[error("request timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("queue factor must be at least 1")]
    ZeroQueueFactor,

    #[error("base URL must not be empty")]
    EmptyBaseUrl,

    #[error("compression level {0} is outside 0..=9")]
    CompressionLevel(u32),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] blockdump_fetch::FetchError),

    #[error(transparent)]
    Ledger(#[from] blockdump_ledger::Error),

    #[error("failed to prepare {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to place a block on disk.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Fs(#[from] blockdump_fs::Error),

    #[error("stored file {0} does not read back as JSON")]
    Corrupt(PathBuf),

    #[error("storage task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
