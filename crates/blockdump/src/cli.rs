use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Debug, Parser)]
#[command(name = "blockdump", version, about = "Resumable block downloads and JSON-lines merges")]
pub struct Cli {
    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download a height range into the sharded dump tree.
    Download(DownloadArgs),
    /// Merge stored blocks into one JSON-lines file.
    Merge(MergeArgs),
    /// Merge per-block transaction files in the order of a block merge.
    MergeTxs(MergeTxsArgs),
    /// Look up one transaction over line-delimited JSON-RPC.
    Tx(TxArgs),
}

/// Flags override the config file and `BLOCKDUMP_*` variables.
///
/// Unset flags are omitted from serialization so lower layers show through.
#[derive(Debug, Default, Args, Serialize)]
pub struct DownloadArgs {
    /// TOML config file [default: blockdump.toml when present]
    #[arg(long, value_name = "PATH")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    #[serde(skip)]
    pub print_config: bool,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,

    #[arg(long, value_name = "DIR")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<PathBuf>,

    /// Ledger path [default: <out-dir>/progress.csv]
    #[arg(long, value_name = "PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<PathBuf>,

    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    #[serde(rename = "timeout_secs", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Attempts per height.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// JSON-lines log of heights that exhaust their retries.
    #[arg(long, value_name = "PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[arg(long, default_value = "dump", value_name = "DIR")]
    pub dump_dir: PathBuf,

    #[arg(long, default_value = "dump/blocks.jsonl", value_name = "PATH")]
    pub out: PathBuf,

    /// First height, inclusive; walks the range instead of scanning.
    #[arg(long, requires = "end", conflicts_with = "order_from")]
    pub start: Option<u64>,

    /// Last height, inclusive.
    #[arg(long, requires = "start")]
    pub end: Option<u64>,

    /// Take heights, in order, from an earlier merged file.
    #[arg(long, value_name = "PATH")]
    pub order_from: Option<PathBuf>,

    /// Stop at the first bad height and keep the previous output.
    #[arg(long)]
    pub strict: bool,

    /// Error log; pass '' to disable [default: <dump-dir>/blocks_to_jsonl_errors.jsonl]
    #[arg(long, value_name = "PATH")]
    pub errors: Option<String>,
}

#[derive(Debug, Args)]
pub struct MergeTxsArgs {
    #[arg(long, default_value = "dump", value_name = "DIR")]
    pub dump_dir: PathBuf,

    /// Merged blocks whose order the transactions follow.
    #[arg(long, default_value = "dump/blocks.jsonl", value_name = "PATH")]
    pub blocks_jsonl: PathBuf,

    #[arg(long, default_value = "dump/txs.jsonl", value_name = "PATH")]
    pub out: PathBuf,

    #[arg(long)]
    pub strict: bool,

    /// Error log; pass '' to disable [default: <dump-dir>/txs_to_jsonl_errors.jsonl]
    #[arg(long, value_name = "PATH")]
    pub errors: Option<String>,
}

#[derive(Debug, Args)]
pub struct TxArgs {
    /// 64-character hex transaction id.
    pub txid: String,

    #[arg(long, default_value = blockdump_rpc::DEFAULT_HOST)]
    pub host: String,

    #[arg(long, default_value_t = blockdump_rpc::DEFAULT_PORT)]
    pub port: u16,

    /// Seconds to wait for each response.
    #[arg(long, default_value_t = 10.0, value_name = "SECS")]
    pub timeout: f64,

    /// Print the serialized transaction hex instead of the decoded object.
    #[arg(long)]
    pub raw: bool,

    /// Keep the `hex` field in decoded output.
    #[arg(long, conflicts_with = "raw")]
    pub keep_hex: bool,
}

/// An absent flag selects `default`; an empty one disables the log.
pub fn error_log_path(flag: Option<&str>, default: PathBuf) -> Option<PathBuf> {
    match flag {
        None => Some(default),
        Some(path) if path.trim().is_empty() => None,
        Some(path) => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn range_needs_both_ends() {
        assert!(Cli::try_parse_from(["blockdump", "merge", "--start", "1"]).is_err());
        assert!(Cli::try_parse_from(["blockdump", "merge", "--start", "1", "--end", "2"]).is_ok());
    }

    #[test]
    fn empty_errors_flag_disables_log() {
        let default = PathBuf::from("dump/e.jsonl");
        assert_eq!(error_log_path(None, default.clone()), Some(default.clone()));
        assert_eq!(error_log_path(Some(""), default.clone()), None);
        assert_eq!(error_log_path(Some("x.jsonl"), default), Some(PathBuf::from("x.jsonl")));
    }
}
