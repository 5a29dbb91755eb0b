use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_safe_multisig_core::{ChainReader, PortError, ReceiptSummary};

/// Minimal JSON-RPC 2.0 client over HTTP.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Transport(format!("failed to initialize http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(url = %self.url, method, id, "json-rpc request");
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Transport(format!("{method} json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!("{method} status {status}: {body}")));
        }
        if let Some(err) = body.get("error") {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| err.to_string());
            return Err(PortError::Transport(format!("{method} returned error: {message}")));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport(format!("{method} response missing result")))
    }
}

pub fn quantity_to_u64(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex quantity {s}: {e}")))
    } else {
        s.parse()
            .map_err(|e| PortError::Validation(format!("invalid quantity {s}: {e}")))
    }
}

pub fn quantity_to_u256(value: &Value) -> Result<U256, PortError> {
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be a hex string".to_owned()))?;
    s.parse()
        .map_err(|e| PortError::Validation(format!("invalid quantity {s}: {e}")))
}

pub fn hex_bytes(value: &Value) -> Result<Bytes, PortError> {
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("expected hex data string".to_owned()))?;
    s.parse()
        .map_err(|e| PortError::Validation(format!("invalid hex data: {e}")))
}

pub fn hex_hash(value: &Value) -> Result<B256, PortError> {
    let s = value
        .as_str()
        .ok_or_else(|| PortError::Validation("expected 32-byte hash string".to_owned()))?;
    s.parse()
        .map_err(|e| PortError::Validation(format!("invalid hash {s}: {e}")))
}

/// [`ChainReader`] against an Ethereum node's JSON-RPC endpoint.
#[derive(Debug)]
pub struct JsonRpcChainReader {
    rpc: JsonRpcClient,
    poll_interval: Duration,
}

impl JsonRpcChainReader {
    pub fn new(rpc: JsonRpcClient, poll_interval: Duration) -> Self {
        Self { rpc, poll_interval }
    }

    pub fn rpc(&self) -> &JsonRpcClient {
        &self.rpc
    }

    pub async fn chain_id(&self) -> Result<u64, PortError> {
        quantity_to_u64(&self.rpc.request("eth_chainId", json!([])).await?)
    }
}

#[async_trait]
impl ChainReader for JsonRpcChainReader {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError> {
        let result = self
            .rpc
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        hex_bytes(&result)
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, PortError> {
        let result = self
            .rpc
            .request("eth_getCode", json!([address, "latest"]))
            .await?;
        hex_bytes(&result)
    }

    async fn balance(&self, address: Address) -> Result<U256, PortError> {
        let result = self
            .rpc
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        quantity_to_u256(&result)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, PortError> {
        let result = self
            .rpc
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let status = result
            .get("status")
            .ok_or_else(|| PortError::Validation(format!("receipt {hash} has no status")))?;
        let block_number = match result.get("blockNumber") {
            Some(v) if !v.is_null() => Some(quantity_to_u64(v)?),
            _ => None,
        };
        Ok(Some(ReceiptSummary {
            transaction_hash: hash,
            success: quantity_to_u64(status)? == 1,
            block_number,
        }))
    }

    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<ReceiptSummary, PortError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                tracing::debug!(%hash, success = receipt.success, "receipt found");
                return Ok(receipt);
            }
            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(PortError::Transport(format!(
                    "no receipt for {hash} within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
