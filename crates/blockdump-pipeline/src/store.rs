use std::path::{Path, PathBuf};

use blockdump_fetch::Record;
use blockdump_fs::{AtomicWriteOptions, BlockLayout, exists_and_valid, write_json_gz};

use crate::error::PersistError;

/// Async face of the block files; disk work runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct BlockStore {
    layout: BlockLayout,
    level:  u32,
    verify: bool,
}

impl BlockStore {
    pub fn new(layout: BlockLayout, level: u32, verify: bool) -> Self {
        Self { layout, level, verify }
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn path_for(&self, height: u64) -> PathBuf {
        self.layout.path_for(height)
    }

    pub async fn is_valid(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || exists_and_valid(&path))
            .await
            .unwrap_or(false)
    }

    /// Place `record` at its sharded path.
    ///
    /// Once started, the write runs to completion even if the caller's
    /// future is dropped, so the destination never holds a partial file.
    pub async fn persist(&self, record: Record) -> Result<PathBuf, PersistError> {
        let path = self.path_for(record.height());
        let level = self.level;
        let verify = self.verify;

        tokio::task::spawn_blocking(move || {
            let value = record.into_value();
            write_json_gz(&path, &value, level, AtomicWriteOptions::new())?;
            if verify { read_back(path) } else { Ok(path) }
        })
        .await
        .map_err(|e| PersistError::Join(e.to_string()))?
    }
}

fn read_back(path: PathBuf) -> Result<PathBuf, PersistError> {
    if exists_and_valid(&path) {
        Ok(path)
    } else {
        Err(PersistError::Corrupt(path))
    }
}
