use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{Result, RpcError};

/// Longest accepted response line.
pub const MAX_LINE: usize = 10_000_000;

#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub id:     u64,
    pub method: &'a str,
    pub params: &'a Value,
}

impl Request<'_> {
    /// Compact JSON terminated by a newline.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self).map_err(RpcError::Encode)?;
        line.push(b'\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Response {
    pub id:     Option<Value>,
    pub result: Option<Value>,
    pub error:  Option<Value>,
}

impl Response {
    /// Null errors count as success.
    pub fn error(&self) -> Option<&Value> {
        self.error.as_ref().filter(|e| !e.is_null())
    }

    pub fn decode(line: &[u8]) -> Result<Self> {
        serde_json::from_slice(line).map_err(|source| RpcError::Decode {
            source,
            line: String::from_utf8_lossy(line).into_owned(),
        })
    }
}

/// Read up to and including the next `\n`.
///
/// End of stream before a newline is [`RpcError::Closed`]; more than
/// `limit` bytes without one is [`RpcError::TooLarge`].
pub async fn read_line<R>(reader: &mut R, limit: usize) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    (&mut *reader).take(cap).read_until(b'\n', &mut line).await?;

    if line.last() == Some(&b'\n') {
        Ok(line)
    } else if line.len() > limit {
        Err(RpcError::TooLarge(limit))
    } else {
        Err(RpcError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_is_one_compact_line() {
        let params = json!(["ab", true]);
        let line = Request {
            id:     1,
            method: "blockchain.transaction.get",
            params: &params,
        }
        .encode()
        .unwrap();
        assert_eq!(
            line,
            b"{\"id\":1,\"method\":\"blockchain.transaction.get\",\"params\":[\"ab\",true]}\n"
        );
    }

    #[test]
    fn null_error_is_not_an_error() {
        let response = Response::decode(br#"{"id":0,"result":["x","1.4"],"error":null}"#).unwrap();
        assert!(response.error().is_none());
        assert_eq!(response.result, Some(json!(["x", "1.4"])));
    }

    #[tokio::test]
    async fn read_line_stops_at_newline() {
        let mut input: &[u8] = b"{\"a\":1}\n{\"b\":2}\n";
        assert_eq!(read_line(&mut input, 64).await.unwrap(), b"{\"a\":1}\n");
        assert_eq!(read_line(&mut input, 64).await.unwrap(), b"{\"b\":2}\n");
        assert!(matches!(read_line(&mut input, 64).await, Err(RpcError::Closed)));
    }

    #[tokio::test]
    async fn read_line_enforces_limit() {
        let mut input: &[u8] = b"0123456789\n";
        assert!(matches!(read_line(&mut input, 4).await, Err(RpcError::TooLarge(4))));
    }

    #[tokio::test]
    async fn partial_line_at_eof_is_closed() {
        let mut input: &[u8] = b"{\"a\":";
        assert!(matches!(read_line(&mut input, 64).await, Err(RpcError::Closed)));
    }
}
