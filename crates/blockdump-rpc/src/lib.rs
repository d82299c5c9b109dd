//! Newline-delimited JSON-RPC over TCP, for one-off transaction lookups.

mod client;
mod error;
mod protocol;
mod tx;

pub use client::{CONNECT_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT, RpcClient, RpcOptions};
pub use error::{Result, RpcError};
pub use protocol::{MAX_LINE, Response};
pub use tx::{CLIENT_NAME, PROTOCOL_VERSION, Transaction, TxFormat, Txid, get_transaction, handshake};
