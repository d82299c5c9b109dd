use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("start height {start} is greater than end height {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("failed to scan {path}: {source}")]
    Scan {
        path:   PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("{path}:{line}: {reason}")]
    HeightList {
        path:   PathBuf,
        line:   usize,
        reason: String,
    },

    /// Strict mode stopped at the first bad height; the output was not replaced.
    #[error("height {height} ({path}): {reason}")]
    Strict {
        height: u64,
        path:   PathBuf,
        reason: String,
    },

    #[error(transparent)]
    Fs(#[from] blockdump_fs::Error),

    #[error("failed to access {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MergeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| MergeError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;
