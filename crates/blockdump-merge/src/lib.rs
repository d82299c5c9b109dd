//! Merge the sharded per-block tree into single JSON-lines files.
//!
//! Heights come from a directory scan ([`scan_blocks`]), a closed range
//! ([`range_items`]) or the order of an earlier merge
//! ([`heights_from_jsonl`]). Output is staged next to its destination and
//! renamed into place only when the merge finishes.

mod blocks;
mod error;
mod report;
mod sink;
mod source;
mod txs;

pub use blocks::merge_blocks;
pub use error::{MergeError, Result};
pub use report::{MergeOptions, MergeReport};
pub use source::{MergeItem, heights_from_jsonl, range_items, scan_blocks};
pub use txs::merge_txs;
