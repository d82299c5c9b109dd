use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open ledger {path}: {source}")]
    Open {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger load task failed: {0}")]
    Join(String),

    #[error("failed to append to ledger {path}: {source}")]
    Append {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode ledger row: {0}")]
    Encode(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
