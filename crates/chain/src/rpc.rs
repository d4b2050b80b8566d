//! JSON-RPC 2.0 transport.
//!
//! One client per endpoint; requests are numbered per client. Node-side
//! errors keep their message and data text so callers can classify revert
//! reasons.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// JSON-RPC transport error types.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Error object returned by the node. `data` often carries the revert
    /// reason for failed calls.
    #[error("Node error {code}: {message}{}", .data.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Node {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type for transport operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// A JSON-RPC 2.0 client bound to one HTTP endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and unwrap the `result` member.
    pub async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(RpcError::Node {
                code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown node error")
                    .to_string(),
                data: error.get("data").map(render_error_data),
            });
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::Protocol("response has neither result nor error".to_string()))
    }
}

/// Error `data` may be a string, an object, or absent; flatten to text.
fn render_error_data(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse an Ethereum quantity (`"0x1a"`) into a u64.
pub fn quantity_to_u64(value: &Value) -> RpcResult<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Protocol(format!("expected quantity string, got {value}")))?;
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(stripped, 16)
        .map_err(|_| RpcError::Protocol(format!("bad quantity: {text}")))
}

/// Decode `0x`-prefixed response data into bytes.
pub fn data_to_bytes(value: &Value) -> RpcResult<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcError::Protocol(format!("expected data string, got {value}")))?;
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(stripped).map_err(|_| RpcError::Protocol(format!("bad data hex: {text}")))
}
