use std::path::PathBuf;

use anyhow::Context;
use blockdump_fs::BlockLayout;
use blockdump_merge::{
    MergeItem, MergeOptions, MergeReport, heights_from_jsonl, merge_blocks, merge_txs, range_items, scan_blocks,
};

use super::UsageError;
use crate::cli::{MergeArgs, MergeTxsArgs, error_log_path};
use crate::progress::{ProgressTrackerBuilder, Tracker};

pub async fn run(args: MergeArgs, quiet: bool) -> anyhow::Result<u8> {
    let report = tokio::task::spawn_blocking(move || merge(args, quiet))
        .await
        .context("merge task failed")??;
    Ok(summarize(&report))
}

pub async fn run_txs(args: MergeTxsArgs, quiet: bool) -> anyhow::Result<u8> {
    let report = tokio::task::spawn_blocking(move || merge_tx_files(args, quiet))
        .await
        .context("merge task failed")??;
    Ok(summarize(&report))
}

fn merge(args: MergeArgs, quiet: bool) -> anyhow::Result<MergeReport> {
    let layout = BlockLayout::new(&args.dump_dir);
    let items: Vec<MergeItem> = match (args.start, args.end, &args.order_from) {
        (Some(start), Some(end), _) => {
            range_items(&layout, start, end).map_err(|e| UsageError(e.to_string()))?
        }
        (_, _, Some(order)) => heights_from_jsonl(order)?
            .into_iter()
            .map(|height| MergeItem {
                height,
                path: layout.path_for(height),
            })
            .collect(),
        _ => scan_blocks(layout.blocks_dir())?,
    };

    let options = MergeOptions {
        strict: args.strict,
        errors: error_log_path(
            args.errors.as_deref(),
            args.dump_dir.join("blocks_to_jsonl_errors.jsonl"),
        ),
    };
    tracing::info!(items = items.len(), out = %args.out.display(), "merging blocks");

    let tracker = tracker(items.len() as u64, "blocks", quiet);
    let report = merge_blocks(items, &args.out, &options, |_| {
        tracker.step(1);
    })?;
    tracker.finish();
    log_errors(options.errors);
    Ok(report)
}

fn merge_tx_files(args: MergeTxsArgs, quiet: bool) -> anyhow::Result<MergeReport> {
    if !args.blocks_jsonl.exists() {
        return Err(UsageError(format!("{} not found", args.blocks_jsonl.display())).into());
    }
    let heights = heights_from_jsonl(&args.blocks_jsonl)?;
    let options = MergeOptions {
        strict: args.strict,
        errors: error_log_path(
            args.errors.as_deref(),
            args.dump_dir.join("txs_to_jsonl_errors.jsonl"),
        ),
    };
    tracing::info!(blocks = heights.len(), out = %args.out.display(), "merging transactions");

    let tracker = tracker(heights.len() as u64, "txs", quiet);
    let report = merge_txs(heights, &BlockLayout::new(&args.dump_dir), &args.out, &options, |_| {
        tracker.step(1);
    })?;
    tracker.finish();
    log_errors(options.errors);
    Ok(report)
}

fn tracker(len: u64, prefix: &str, quiet: bool) -> crate::progress::ProgressTracker {
    ProgressTrackerBuilder::default()
        .with_len(len)
        .with_prefix(prefix)
        .hidden(quiet)
        .build()
}

fn log_errors(path: Option<PathBuf>) {
    if let Some(path) = path {
        tracing::info!(path = %path.display(), "error log written");
    }
}

fn summarize(report: &MergeReport) -> u8 {
    println!("{report}");
    report.exit_code() as u8
}
