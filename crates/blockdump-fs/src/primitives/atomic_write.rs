use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_SUFFIX: &str = ".part";

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub sync:   bool,
    pub suffix: &'static str,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sync:   true,
            suffix: DEFAULT_SUFFIX,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }
}

/// Sibling path used while `path` is being written.
pub fn staging_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// A file that only appears at its final path once [`AtomicFile::commit`] succeeds.
///
/// Bytes go to a suffixed sibling in the same directory; commit flushes and
/// renames it over the destination. Dropping without committing removes the
/// staging file and leaves the destination untouched.
pub struct AtomicFile {
    target:  PathBuf,
    staging: PathBuf,
    writer:  Option<BufWriter<File>>,
    sync:    bool,
}

impl AtomicFile {
    pub fn create(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let target = path.as_ref().to_path_buf();
        let parent = target
            .parent()
            .ok_or_else(|| Error::NoParent(target.clone()))?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::Write {
                path:   parent.to_path_buf(),
                source: e,
            })?;
        }

        let staging = staging_path(&target, options.suffix);
        let file = File::create(&staging).map_err(|e| Error::Write {
            path:   staging.clone(),
            source: e,
        })?;

        Ok(Self {
            target,
            staging,
            writer: Some(BufWriter::new(file)),
            sync: options.sync,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn staging(&self) -> &Path {
        &self.staging
    }

    pub fn commit(mut self) -> Result<PathBuf> {
        let Some(writer) = self.writer.take() else {
            return Ok(self.target.clone());
        };
        let file = writer.into_inner().map_err(|e| Error::Write {
            path:   self.staging.clone(),
            source: e.into_error(),
        })?;
        if self.sync {
            file.sync_all().map_err(|e| Error::Write {
                path:   self.staging.clone(),
                source: e,
            })?;
        }
        drop(file);

        if let Err(e) = fs::rename(&self.staging, &self.target) {
            let _ = fs::remove_file(&self.staging);
            return Err(Error::Write {
                path:   self.target.clone(),
                source: e,
            });
        }
        Ok(self.target.clone())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.writer.as_mut() {
            Some(w) => w.write(buf),
            None => Err(std::io::Error::other("atomic file already committed")),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.writer.take().is_some() {
            let _ = fs::remove_file(&self.staging);
        }
    }
}

pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: Options) -> Result<()> {
    let mut file = AtomicFile::create(path, options)?;
    file.write_all(content).map_err(|e| Error::Write {
        path:   file.staging().to_path_buf(),
        source: e,
    })?;
    file.commit()?;
    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| Error::Read {
        path:   path.to_path_buf(),
        source: e,
    })
}
