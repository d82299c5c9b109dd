//! Filesystem primitives for the block dump.
//!
//! - [`primitives`] - write-to-sibling-then-rename placement
//! - [`gz`] - gzip compact-JSON documents and the validity probe
//! - [`layout`] - sharded per-height paths
//! - [`record`] - canonical stored-record shape

mod error;
pub mod gz;
pub mod layout;
pub mod primitives;
pub mod record;

pub use error::{Error, Result};
pub use gz::{exists_and_valid, read_json_gz, write_json_gz};
pub use layout::BlockLayout;
pub use primitives::{AtomicFile, AtomicWriteOptions, atomic_read, atomic_write};
