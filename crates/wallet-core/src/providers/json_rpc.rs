//! JSON-RPC 2.0 over HTTP, shared by the EVM and Solana handlers.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{check_status, ProviderError};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct JsonRpcClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Call `method` and deserialize `result` into `T`.
    ///
    /// A JSON `null` result deserializes into `Option::None`, so callers that
    /// expect "not found" ask for `Option<_>`.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ProviderError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!(url = %self.url, method, "json-rpc call");

        let resp = self.client.post(&self.url).json(&request).send().await?;
        let body: RpcResponse = check_status(resp).await?.json().await?;
        decode_response(body)
    }
}

fn decode_response<T: DeserializeOwned>(body: RpcResponse) -> Result<T, ProviderError> {
    if let Some(err) = body.error {
        return Err(ProviderError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    serde_json::from_value(body.result)
        .map_err(|e| ProviderError::InvalidResponse(format!("result: {e}")))
}

fn strip_hex(quantity: &str) -> &str {
    quantity
        .strip_prefix("0x")
        .or_else(|| quantity.strip_prefix("0X"))
        .unwrap_or(quantity)
}

/// Parse an Ethereum hex quantity (`"0x1a"`).
pub fn parse_quantity(quantity: &str) -> Result<U256, ProviderError> {
    let digits = strip_hex(quantity);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("quantity {quantity:?}: {e}")))
}

pub fn parse_quantity_u64(quantity: &str) -> Result<u64, ProviderError> {
    u64::from_str_radix(strip_hex(quantity), 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("quantity {quantity:?}: {e}")))
}

pub fn parse_quantity_u128(quantity: &str) -> Result<u128, ProviderError> {
    u128::from_str_radix(strip_hex(quantity), 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("quantity {quantity:?}: {e}")))
}
