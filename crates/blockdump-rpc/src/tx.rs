use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::client::RpcClient;
use crate::error::{Result, RpcError};

pub const CLIENT_NAME: &str = "blockdump";
pub const PROTOCOL_VERSION: &str = "1.4";

/// A 64-character hex transaction id, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Txid(String);

impl Txid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Txid {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        let txid = s.trim().to_ascii_lowercase();
        if txid.len() == 64 && txid.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Txid(txid))
        } else {
            Err(RpcError::InvalidTxid(s.to_string()))
        }
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxFormat {
    /// Decoded object; `hex` is dropped unless `keep_hex`.
    Verbose { keep_hex: bool },
    /// Serialized transaction as a hex string.
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    Verbose(Map<String, Value>),
    Raw(String),
}

/// Announce ourselves; servers that reject it are still queried.
pub async fn handshake(client: &mut RpcClient) -> Result<()> {
    let response = client
        .request("server.version", json!([CLIENT_NAME, PROTOCOL_VERSION]))
        .await?;
    match response.error() {
        Some(error) => tracing::warn!("server.version failed: {error}"),
        None => tracing::debug!(version = ?response.result, "handshake done"),
    }
    Ok(())
}

pub async fn get_transaction(client: &mut RpcClient, txid: &Txid, format: TxFormat) -> Result<Transaction> {
    let params = match format {
        TxFormat::Verbose { .. } => json!([txid.as_str(), true]),
        TxFormat::Raw => json!([txid.as_str()]),
    };
    let result = client.call("blockchain.transaction.get", params).await?;
    shape(result, format)
}

fn shape(result: Value, format: TxFormat) -> Result<Transaction> {
    match (format, result) {
        (TxFormat::Verbose { keep_hex }, Value::Object(mut tx)) => {
            if !keep_hex {
                tx.remove("hex");
            }
            Ok(Transaction::Verbose(tx))
        }
        (TxFormat::Raw, Value::String(hex)) => Ok(Transaction::Raw(hex)),
        (TxFormat::Verbose { .. }, result) => Err(RpcError::UnexpectedShape {
            expected: "verbose object",
            result,
        }),
        (TxFormat::Raw, result) => Err(RpcError::UnexpectedShape {
            expected: "raw hex string",
            result,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TXID: &str = "4A5E1E4BAAB89F3A32518A88C31BC87F618F76673E2CC77AB2127B7AFDEDA33B";

    #[test]
    fn txid_is_normalised() {
        let txid: Txid = format!("  {TXID}\n").parse().unwrap();
        assert_eq!(txid.as_str(), TXID.to_lowercase());
    }

    #[test]
    fn malformed_txids_are_rejected() {
        assert!("abc".parse::<Txid>().is_err());
        assert!(format!("{}zz", &TXID[..62]).parse::<Txid>().is_err());
        assert!(format!("{TXID}00").parse::<Txid>().is_err());
    }

    #[test]
    fn verbose_strips_hex_by_default() {
        let result = json!({"txid": "ab", "hex": "0100"});
        assert_eq!(
            shape(result.clone(), TxFormat::Verbose { keep_hex: false }).unwrap(),
            Transaction::Verbose(json!({"txid": "ab"}).as_object().unwrap().clone())
        );
        assert!(matches!(
            shape(result, TxFormat::Verbose { keep_hex: true }).unwrap(),
            Transaction::Verbose(tx) if tx.contains_key("hex")
        ));
    }

    #[test]
    fn shape_mismatch_keeps_result() {
        match shape(json!("0100"), TxFormat::Verbose { keep_hex: false }) {
            Err(RpcError::UnexpectedShape { result, .. }) => assert_eq!(result, json!("0100")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(shape(json!({"a": 1}), TxFormat::Raw).is_err());
    }
}
