use anyhow::Context;
use blockdump_fetch::ReqwestClient;
use blockdump_pipeline::{Coordinator, Resolution, install_signal_handlers};
use tokio_util::sync::CancellationToken;

use crate::cli::DownloadArgs;
use crate::config;
use crate::progress::{ProgressTrackerBuilder, Tracker};

pub async fn run(args: DownloadArgs, quiet: bool) -> anyhow::Result<u8> {
    let config = config::load(&args)?;
    if args.print_config {
        print!("{}", toml::to_string_pretty(&config).context("cannot render configuration")?);
        return Ok(0);
    }
    config.validate()?;

    let client = ReqwestClient::new(&config.fetch_options())?;
    let cancel = CancellationToken::new();
    let signals = install_signal_handlers(cancel.clone());

    let tracker = ProgressTrackerBuilder::default()
        .with_len(config.total())
        .with_prefix("blocks")
        .with_finish("done")
        .hidden(quiet)
        .build();
    let bar = tracker.clone();

    let report = Coordinator::new(config, client)
        .on_progress(move |event| {
            bar.set_position(event.processed);
            if let Resolution::Failed { tries } = event.resolution {
                bar.set_message(format!("last failure: {} after {tries} tries", event.height));
            }
        })
        .run(cancel.clone())
        .await;
    signals.abort();
    let report = report?;

    if report.interrupted {
        tracker.abandon();
    } else {
        tracker.finish();
    }
    println!(
        "done: ok={} fail={} skipped={} repaired={} interrupted={}",
        report.ok(),
        report.failed + report.ledger_errors,
        report.skipped,
        report.repaired,
        report.interrupted
    );
    Ok(report.exit_code() as u8)
}
