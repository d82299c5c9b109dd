use std::time::Duration;

use blockdump_rpc::{RpcClient, RpcError, RpcOptions, Transaction, TxFormat, Txid, get_transaction, handshake};

use super::UsageError;
use crate::cli::TxArgs;

pub async fn run(args: TxArgs) -> anyhow::Result<u8> {
    let txid: Txid = args.txid.parse().map_err(|e: RpcError| UsageError(e.to_string()))?;
    let timeout = Duration::try_from_secs_f64(args.timeout)
        .map_err(|_| UsageError(format!("invalid timeout {}", args.timeout)))?;
    let format = if args.raw {
        TxFormat::Raw
    } else {
        TxFormat::Verbose {
            keep_hex: args.keep_hex,
        }
    };

    let mut client = RpcClient::connect(&args.host, args.port, RpcOptions::default().timeout(timeout)).await?;
    handshake(&mut client).await?;

    match get_transaction(&mut client, &txid, format).await {
        Ok(Transaction::Verbose(tx)) => {
            println!("{}", serde_json::to_string_pretty(&tx)?);
            Ok(0)
        }
        Ok(Transaction::Raw(hex)) => {
            println!("{hex}");
            Ok(0)
        }
        Err(RpcError::UnexpectedShape { expected, result }) => {
            let hint = match format {
                TxFormat::Raw => "without --raw",
                TxFormat::Verbose { .. } => "with --raw",
            };
            tracing::error!("server did not return a {expected}; try again {hint}");
            match result {
                serde_json::Value::String(s) => println!("{s}"),
                other => println!("{}", serde_json::to_string_pretty(&other)?),
            }
            Ok(1)
        }
        Err(e) => Err(e.into()),
    }
}
