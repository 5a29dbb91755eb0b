use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::UndeployedSafe;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("policy error: {0}")]
    Policy(String),
}

/// Minimal view of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub transaction_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
}

/// A connected wallet. Key custody stays on the other side of this trait.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    async fn address(&self) -> Result<Address, PortError>;
    async fn chain_id(&self) -> Result<u64, PortError>;
    /// Returns a 65-byte `r ‖ s ‖ v` signature over `digest`.
    async fn sign_digest(&self, digest: B256) -> Result<Bytes, PortError>;
    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<B256, PortError>;
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError>;
    async fn code_at(&self, address: Address) -> Result<Bytes, PortError>;
    async fn balance(&self, address: Address) -> Result<U256, PortError>;
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, PortError>;
    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<ReceiptSummary, PortError>;
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PortError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PortError>;
    fn delete(&self, key: &str) -> Result<(), PortError>;
}

/// One store can back several components.
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), PortError> {
        (**self).delete(key)
    }
}

/// Terminal responses for a dApp session request.
pub trait RequestResponder: Send + Sync {
    fn approve(&self, request_id: &str, result: Value) -> Result<(), PortError>;
    fn reject(&self, request_id: &str, code: i64, message: &str) -> Result<(), PortError>;
}

/// Local records of accounts that exist only as configuration.
pub trait AccountRegistry: Send + Sync {
    fn load_undeployed(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<UndeployedSafe>, PortError>;
    fn save_undeployed(&self, safe: &UndeployedSafe) -> Result<(), PortError>;
    fn remove_undeployed(&self, chain_id: u64, address: Address) -> Result<(), PortError>;
    /// Records the account as deployed and drops its undeployed record.
    fn mark_deployed(&self, chain_id: u64, address: Address) -> Result<(), PortError>;
}

pub trait AbiPort: Send + Sync {
    fn encode_calldata(
        &self,
        abi_json: &str,
        method: &str,
        args: &[String],
    ) -> Result<Bytes, PortError>;
}

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> Result<u64, PortError>;
}
