//! Checkpoint ledger for resumable block downloads.
//!
//! The ledger file is CSV with a header row:
//! `height,status,path,tries,http_status,error,updated_at_utc`.
//! Rows are only ever appended; the state for a height is its last row.

mod error;
mod ledger;
mod row;

pub use error::{Error, Result};
pub use ledger::Ledger;
pub use row::{COLUMNS, CheckpointRow, ParseStatusError, Status, utc_now};
