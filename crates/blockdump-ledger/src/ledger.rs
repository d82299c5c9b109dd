use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::row::{COLUMNS, CheckpointRow, RawRow};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct WriterState {
    /// The file ends mid-line (a crash during a previous append).
    needs_newline: bool,
}

/// Durable, append-only record of per-height outcomes.
///
/// The in-memory index holds the most recent row for each height, in file
/// order, and is updated under the same lock that serializes appends.
#[derive(Debug)]
pub struct Ledger {
    path:   PathBuf,
    index:  RwLock<HashMap<u64, CheckpointRow>>,
    writer: Mutex<WriterState>,
}

impl Ledger {
    /// Load the ledger at `path`, tolerating a missing file and malformed rows.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Open { path, source: e }),
        };

        let needs_newline = bytes.last().is_some_and(|b| *b != b'\n');
        let index = reduce(&path, &bytes);
        tracing::debug!(path = %path.display(), heights = index.len(), "loaded checkpoint ledger");

        Ok(Self {
            path,
            index: RwLock::new(index),
            writer: Mutex::new(WriterState { needs_newline }),
        })
    }

    /// [`Ledger::load`] on the blocking pool.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tokio::task::spawn_blocking(move || Self::load(path))
            .await
            .map_err(|e| Error::Join(e.to_string()))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent recorded outcome for `height`.
    pub fn latest(&self, height: u64) -> Option<CheckpointRow> {
        self.read_index().get(&height).cloned()
    }

    pub fn len(&self) -> usize {
        self.read_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_index().is_empty()
    }

    /// Ordered copy of the reduced state.
    pub fn snapshot(&self) -> BTreeMap<u64, CheckpointRow> {
        self.read_index().iter().map(|(h, r)| (*h, r.clone())).collect()
    }

    /// Append one row and make it visible to [`Ledger::latest`].
    pub async fn append(&self, row: CheckpointRow) -> Result<()> {
        let mut state = self.writer.lock().await;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.append_error(e))?;
        }

        let existing_len = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(self.append_error(e)),
        };

        let mut buf = Vec::with_capacity(128);
        if existing_len == 0 {
            buf.extend_from_slice(COLUMNS.join(",").as_bytes());
            buf.push(b'\n');
        } else if state.needs_newline {
            buf.push(b'\n');
        }
        buf.extend_from_slice(&encode_row(&row)?);

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.append_error(e))?;
        file.write_all(&buf).await.map_err(|e| self.append_error(e))?;
        file.flush().await.map_err(|e| self.append_error(e))?;

        state.needs_newline = false;
        self.write_index().insert(row.height, row);
        Ok(())
    }

    /// [`Ledger::append`] with a bounded number of local retries.
    pub async fn append_with_retry(&self, row: CheckpointRow, attempts: u32, delay: Duration) -> Result<()> {
        let attempts = attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.append(row.clone()).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    tracing::warn!(height = row.height, attempt, error = %e, "checkpoint append failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn append_error(&self, source: std::io::Error) -> Error {
        Error::Append {
            path: self.path.clone(),
            source,
        }
    }

    fn read_index(&self) -> RwLockReadGuard<'_, HashMap<u64, CheckpointRow>> {
        self.index.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_index(&self) -> RwLockWriteGuard<'_, HashMap<u64, CheckpointRow>> {
        self.index.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Last-write-wins reduction of ledger bytes, skipping rows that do not parse.
fn reduce(path: &Path, bytes: &[u8]) -> HashMap<u64, CheckpointRow> {
    let mut index = HashMap::new();
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    if let Err(e) = reader.headers() {
        tracing::warn!(path = %path.display(), error = %e, "unreadable checkpoint header, starting empty");
        return index;
    }

    for (idx, record) in reader.deserialize::<RawRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        let raw = match record {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), line, error = %e, "skipping unreadable checkpoint row");
                continue;
            }
        };
        match CheckpointRow::try_from(raw) {
            Ok(row) => {
                index.insert(row.height, row);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), line, error = %e, "skipping malformed checkpoint row");
            }
        }
    }

    index
}

fn encode_row(row: &CheckpointRow) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.serialize(row)?;
    writer.flush().map_err(csv::Error::from)?;
    writer
        .into_inner()
        .map_err(|e| Error::Encode(csv::Error::from(e.into_error())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Status;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::load(dir.path().join("progress.csv")).unwrap();
        assert!(ledger.is_empty());
        assert!(ledger.latest(1).is_none());
    }

    #[test]
    fn reduce_keeps_last_row_per_height() {
        let csv = "height,status,path,tries,http_status,error,updated_at_utc\n\
                   7,fail,p7,8,503,HTTP 503: busy,2024-01-01T00:00:00Z\n\
                   8,ok,p8,1,200,,2024-01-01T00:00:01Z\n\
                   7,ok,p7,2,200,,2024-01-01T00:00:02Z\n";
        let index = reduce(Path::new("progress.csv"), csv.as_bytes());
        assert_eq!(index.len(), 2);
        assert_eq!(index[&7].status, Status::Ok);
        assert_eq!(index[&7].tries, 2);
    }

    #[test]
    fn reduce_skips_malformed_rows() {
        let csv = "height,status,path,tries,http_status,error,updated_at_utc\n\
                   abc,ok,p,1,200,,t\n\
                   9,maybe,p9,1,200,,t\n\
                   10,ok,p10,one,200,,t\n\
                   11,ok,p11,1,200,,t\n\
                   12,ok";
        let index = reduce(Path::new("progress.csv"), csv.as_bytes());
        let heights: std::collections::BTreeSet<u64> = index.keys().copied().collect();
        assert_eq!(heights, std::collections::BTreeSet::from([11, 12]));
        assert_eq!(index[&12].path, "");
    }

    #[test]
    fn error_text_with_commas_and_quotes_round_trips() {
        let row = CheckpointRow::fail(3, "p3", 8, "", "HTTP 500: \"oops\", retry\nlater");
        let mut bytes = COLUMNS.join(",").into_bytes();
        bytes.push(b'\n');
        bytes.extend(encode_row(&row).unwrap());
        let index = reduce(Path::new("progress.csv"), &bytes);
        assert_eq!(index[&3].error, "HTTP 500: \"oops\", retry\nlater");
    }

    #[tokio::test]
    async fn append_creates_header_once_and_updates_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("progress.csv");
        let ledger = Ledger::load(&path).unwrap();

        ledger.append(CheckpointRow::fail(5, "p5", 8, "503", "busy")).await.unwrap();
        assert_eq!(ledger.latest(5).unwrap().status, Status::Fail);
        ledger.append(CheckpointRow::ok(5, "p5", 1, "200")).await.unwrap();
        assert_eq!(ledger.latest(5).unwrap().status, Status::Ok);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("height,status").count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn append_after_torn_line_starts_on_a_new_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.csv");
        std::fs::write(
            &path,
            "height,status,path,tries,http_status,error,updated_at_utc\n1,ok,p1,1,200,,t\n2,o",
        )
        .unwrap();

        let ledger = Ledger::load(&path).unwrap();
        ledger.append(CheckpointRow::ok(3, "p3", 1, "200")).await.unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert!(reloaded.latest(1).unwrap().is_ok());
        assert!(reloaded.latest(2).is_none());
        assert!(reloaded.latest(3).unwrap().is_ok());
    }

    #[test]
    fn unreadable_header_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.csv");
        let mut bytes = b"heig\xffht,status,path,tries,http_status,error,updated_at_utc\n".to_vec();
        bytes.extend_from_slice(b"1,ok,p1,1,200,,t\n");
        std::fs::write(&path, &bytes).unwrap();

        assert!(reduce(&path, &bytes).is_empty());
        let ledger = Ledger::load(&path).unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn open_loads_on_the_blocking_pool() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress.csv");
        std::fs::write(
            &path,
            "height,status,path,tries,http_status,error,updated_at_utc\n4,ok,p4,1,200,,t\n",
        )
        .unwrap();

        let ledger = Ledger::open(&path).await.unwrap();
        assert!(ledger.latest(4).unwrap().is_ok());
    }

    #[tokio::test]
    async fn append_with_retry_gives_up_after_bounded_attempts() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("ledger");
        let ledger = Ledger::load(parent.join("progress.csv")).unwrap();
        // the parent becomes a regular file, so every append fails
        std::fs::write(&parent, b"").unwrap();

        let started = std::time::Instant::now();
        let result = ledger
            .append_with_retry(CheckpointRow::ok(1, "p1", 1, "200"), 3, Duration::from_millis(20))
            .await;

        assert!(matches!(result, Err(Error::Append { .. })));
        // two sleeps between three attempts
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(ledger.latest(1).is_none());
    }
}
