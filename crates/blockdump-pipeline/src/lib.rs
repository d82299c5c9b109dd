//! Resumable, concurrent download of a block range.
//!
//! A [`Coordinator`] feeds heights through a bounded queue to a pool of
//! workers. Each worker drives one height through an explicit state
//! machine ([`ItemState`]): fetch, validate, persist atomically, record in
//! the checkpoint ledger. Heights already recorded and still valid on disk
//! are skipped, so a rerun of the same range resumes where it stopped.

mod config;
mod coordinator;
mod error;
mod item;
mod progress;
mod sidecar;
mod signal;
mod store;
mod worker;

pub use config::{DEFAULT_BASE_URL, DownloadConfig};
pub use coordinator::Coordinator;
pub use error::{ConfigError, PersistError, PipelineError, Result};
pub use item::{Failure, FailureKind, ItemState};
pub use progress::{ProgressCallback, ProgressEvent, Resolution, RunProgress, RunReport};
pub use sidecar::{ErrorEntry, ErrorSidecar};
pub use signal::install_signal_handlers;
pub use store::BlockStore;
