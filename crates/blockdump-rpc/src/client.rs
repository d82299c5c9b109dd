use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::error::{Result, RpcError};
use crate::protocol::{MAX_LINE, Request, Response, read_line};

pub const DEFAULT_HOST: &str = "wallet.mobick.info";
pub const DEFAULT_PORT: u16 = 40008;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcOptions {
    pub connect_timeout: Duration,
    /// Per-call limit covering the write and the response line.
    pub timeout:         Duration,
    pub max_line:        usize,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            timeout:         DEFAULT_TIMEOUT,
            max_line:        MAX_LINE,
        }
    }
}

impl RpcOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }
}

/// One TCP connection speaking newline-delimited JSON-RPC.
///
/// Calls are strictly sequential; ids count up from zero.
pub struct RpcClient {
    reader:  BufReader<OwnedReadHalf>,
    writer:  OwnedWriteHalf,
    next_id: u64,
    options: RpcOptions,
}

impl RpcClient {
    pub async fn connect(host: &str, port: u16, options: RpcOptions) -> Result<Self> {
        let addr = format!("{host}:{port}");
        let stream = tokio::time::timeout(options.connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| RpcError::ConnectTimeout {
                addr:  addr.clone(),
                after: options.connect_timeout,
            })?
            .map_err(|source| RpcError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_nodelay(true)?;
        tracing::debug!(%addr, "connected");

        let (read, write) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read),
            writer: write,
            next_id: 0,
            options,
        })
    }

    /// Send one request and return the matching response, error field included.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Response> {
        let id = self.next_id;
        self.next_id += 1;
        let line = Request {
            id,
            method,
            params: &params,
        }
        .encode()?;

        let timeout = self.options.timeout;
        let reply = tokio::time::timeout(timeout, self.exchange(&line))
            .await
            .map_err(|_| RpcError::Timeout(timeout))??;

        tracing::trace!(id, method, bytes = reply.len(), "response");
        Response::decode(&reply)
    }

    /// Like [`request`](Self::request), but a non-null error field is an `Err`.
    pub async fn call(&mut self, method: &str, params: Value) -> Result<Value> {
        let response = self.request(method, params).await?;
        if let Some(error) = response.error() {
            return Err(RpcError::Server {
                method: method.to_string(),
                error:  error.clone(),
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn exchange(&mut self, line: &[u8]) -> Result<Vec<u8>> {
        self.writer.write_all(line).await?;
        self.writer.flush().await?;
        read_line(&mut self.reader, self.options.max_line).await
    }
}
