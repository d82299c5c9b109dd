use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One line of the downloader's error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub height:      u64,
    pub tries:       u32,
    pub http_status: Option<u16>,
    pub error:       String,
}

/// Append-only JSON-lines log of exhausted heights.
///
/// Opened on first use. Write failures are logged and otherwise ignored;
/// the ledger row remains the record of the failure.
#[derive(Debug)]
pub struct ErrorSidecar {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl ErrorSidecar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, entry: &ErrorEntry) {
        if let Err(e) = self.try_record(entry).await {
            tracing::warn!(path = %self.path.display(), height = entry.height, "error log write failed: {e}");
        }
    }

    async fn try_record(&self, entry: &ErrorEntry) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            if let Some(parent) = self.path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
            *guard = Some(file);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(&line).await?;
            file.flush().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn appends_one_object_per_line() {
        let dir = tempdir().unwrap();
        let sidecar = ErrorSidecar::new(dir.path().join("logs/errors.jsonl"));

        for height in [4, 5] {
            sidecar
                .record(&ErrorEntry {
                    height,
                    tries: 8,
                    http_status: Some(503),
                    error: "HTTP 503: busy".into(),
                })
                .await;
        }

        let text = std::fs::read_to_string(sidecar.path()).unwrap();
        let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["height"], 5);
        assert_eq!(lines[0]["http_status"], 503);
    }
}
