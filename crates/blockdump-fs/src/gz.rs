//! Gzip-compressed compact JSON, one document per file.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::Value;

use crate::primitives::{AtomicFile, AtomicWriteOptions};
use crate::{Error, Result};

pub const DEFAULT_LEVEL: u32 = 6;

/// Encode `value` as compact JSON inside a gzip stream.
pub fn encode_json_gz(value: &Value, level: u32) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    serde_json::to_writer(&mut encoder, value).map_err(Error::Encode)?;
    encoder.finish().map_err(|e| Error::Encode(serde_json::Error::io(e)))
}

/// Atomically place `value` at `path` as gzip-compressed compact JSON.
///
/// The destination is either left as it was or replaced by a complete file.
pub fn write_json_gz(
    path: impl AsRef<Path>,
    value: &Value,
    level: u32,
    options: AtomicWriteOptions,
) -> Result<()> {
    let file = AtomicFile::create(path, options)?;
    let staging = file.staging().to_path_buf();
    let mut encoder = GzEncoder::new(file, Compression::new(level));
    serde_json::to_writer(&mut encoder, value).map_err(|e| Error::Write {
        path:   staging.clone(),
        source: e.into(),
    })?;
    let mut file = encoder.finish().map_err(|e| Error::Write {
        path:   staging.clone(),
        source: e,
    })?;
    file.flush().map_err(|e| Error::Write {
        path:   staging,
        source: e,
    })?;
    file.commit()?;
    Ok(())
}

pub fn read_json_gz(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::Read {
        path:   path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(GzDecoder::new(file));
    serde_json::from_reader(reader).map_err(|e| Error::Decode {
        path:   path.to_path_buf(),
        source: e,
    })
}

/// True when `path` opens, decompresses, and parses fully as JSON.
///
/// Content is not inspected beyond that.
pub fn exists_and_valid(path: impl AsRef<Path>) -> bool {
    read_json_gz(path).is_ok()
}
