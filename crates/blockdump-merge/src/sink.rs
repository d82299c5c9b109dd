use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use blockdump_fs::{AtomicFile, AtomicWriteOptions};
use serde::Serialize;

use crate::error::{MergeError, Result};

/// Compact JSON, one document per line, placed atomically on [`finish`](Self::finish).
pub(crate) struct JsonlWriter {
    file:  AtomicFile,
    lines: u64,
}

impl JsonlWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            file:  AtomicFile::create(path, AtomicWriteOptions::new())?,
            lines: 0,
        })
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let staging = self.file.staging().to_path_buf();
        serde_json::to_writer(&mut self.file, value)
            .map_err(|e| MergeError::Io {
                path:   staging.clone(),
                source: e.into(),
            })?;
        self.file.write_all(b"\n").map_err(MergeError::io(staging))?;
        self.lines += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<(PathBuf, u64)> {
        let lines = self.lines;
        Ok((self.file.commit()?, lines))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorRow<'a> {
    pub height: u64,
    pub path:   &'a str,
    pub error:  &'a str,
}

/// Per-height error log, truncated when opened.
pub(crate) struct ErrorLog {
    path:   PathBuf,
    writer: BufWriter<File>,
}

impl ErrorLog {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(MergeError::io(parent))?;
        }
        let file = File::create(path).map_err(MergeError::io(path))?;
        Ok(Self {
            path:   path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, height: u64, path: &Path, error: &str) {
        let path = path.to_string_lossy();
        let row = ErrorRow {
            height,
            path: &path,
            error,
        };
        let written = serde_json::to_writer(&mut self.writer, &row)
            .map_err(std::io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(e) = written {
            tracing::warn!(path = %self.path.display(), "error log write failed: {e}");
        }
    }

    pub fn close(mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), "error log flush failed: {e}");
        }
    }
}
