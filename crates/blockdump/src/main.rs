mod cli;
mod commands;
mod config;
mod logging;
mod progress;

use std::process::ExitCode;

use blockdump_merge::MergeError;
use blockdump_pipeline::{ConfigError, PipelineError};
use blockdump_rpc::RpcError;
use clap::Parser;

use crate::cli::{Cli, Command};
use crate::commands::UsageError;
use crate::config::ConfigLoadError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("cannot start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn dispatch(cli: Cli) -> anyhow::Result<u8> {
    match cli.command {
        Command::Download(args) => commands::download::run(args, cli.quiet).await,
        Command::Merge(args) => commands::merge::run(args, cli.quiet).await,
        Command::MergeTxs(args) => commands::merge::run_txs(args, cli.quiet).await,
        Command::Tx(args) => commands::tx::run(args).await,
    }
}

/// `2` for bad input or configuration, `1` for everything else.
fn exit_code(error: &anyhow::Error) -> u8 {
    let usage = error.chain().any(|cause| {
        cause.is::<UsageError>()
            || cause.is::<ConfigError>()
            || cause.is::<ConfigLoadError>()
            || matches!(cause.downcast_ref::<PipelineError>(), Some(PipelineError::Config(_)))
            || matches!(cause.downcast_ref::<RpcError>(), Some(RpcError::InvalidTxid(_)))
            || matches!(cause.downcast_ref::<MergeError>(), Some(MergeError::InvalidRange { .. }))
    });
    if usage { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_exit_with_two() {
        let error = anyhow::Error::from(PipelineError::Config(ConfigError::InvalidRange { start: 2, end: 1 }));
        assert_eq!(exit_code(&error), 2);
        assert_eq!(exit_code(&UsageError("bad".into()).into()), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), 1);
    }
}
