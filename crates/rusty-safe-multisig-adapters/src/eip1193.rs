use std::sync::Mutex;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use serde_json::{json, Value};

use rusty_safe_multisig_core::{PortError, SigningProvider};

use crate::rpc::{hex_bytes, hex_hash, quantity_to_u64, JsonRpcClient};
use crate::MultisigConfig;

/// Gas estimates are padded by this percentage before signing.
const GAS_HEADROOM_PERCENT: u64 = 20;

/// [`SigningProvider`] backed by an EIP-1193 wallet reachable over JSON-RPC, or by a
/// local development key that signs and broadcasts through a node.
#[derive(Debug)]
pub struct Eip1193Signer {
    mode: SignerMode,
}

#[derive(Debug)]
enum SignerMode {
    Disabled(String),
    Proxy {
        wallet: JsonRpcClient,
        account: Mutex<Option<Address>>,
    },
    Local {
        signer: PrivateKeySigner,
        node: JsonRpcClient,
    },
}

impl Eip1193Signer {
    /// A proxy URL wins over a local key; with neither, every call fails with `Policy`.
    pub fn from_config(config: &MultisigConfig) -> Result<Self, PortError> {
        if let Some(url) = &config.eip1193_proxy_url {
            return Ok(Self::proxy(JsonRpcClient::new(
                url.clone(),
                config.request_timeout(),
            )?));
        }
        if let Some(key) = &config.signer_private_key {
            let node = JsonRpcClient::new(config.rpc_url.clone(), config.request_timeout())?;
            return Self::local(key, node);
        }
        Ok(Self::disabled(
            "no signer configured: set RUSTY_SAFE_EIP1193_PROXY_URL or RUSTY_SAFE_SIGNER_PRIVATE_KEY",
        ))
    }

    pub fn proxy(wallet: JsonRpcClient) -> Self {
        Self {
            mode: SignerMode::Proxy {
                wallet,
                account: Mutex::new(None),
            },
        }
    }

    pub fn local(private_key: &str, node: JsonRpcClient) -> Result<Self, PortError> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid private key: {e}")))?;
        Ok(Self {
            mode: SignerMode::Local { signer, node },
        })
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            mode: SignerMode::Disabled(reason.into()),
        }
    }

    async fn proxy_account(
        wallet: &JsonRpcClient,
        cached: &Mutex<Option<Address>>,
    ) -> Result<Address, PortError> {
        let known = *cached
            .lock()
            .map_err(|e| PortError::Transport(format!("signer lock poisoned: {e}")))?;
        if let Some(account) = known {
            return Ok(account);
        }
        let result = wallet.request("eth_requestAccounts", json!([])).await?;
        let first = result
            .as_array()
            .and_then(|accounts| accounts.first())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PortError::Policy("no wallet accounts available; unlock/connect wallet".to_owned())
            })?;
        let account: Address = first
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
        *cached
            .lock()
            .map_err(|e| PortError::Transport(format!("signer lock poisoned: {e}")))? = Some(account);
        Ok(account)
    }

    async fn send_local(
        signer: &PrivateKeySigner,
        node: &JsonRpcClient,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<B256, PortError> {
        let from = signer.address();
        let chain_id = quantity_to_u64(&node.request("eth_chainId", json!([])).await?)?;
        let nonce = quantity_to_u64(
            &node
                .request("eth_getTransactionCount", json!([from, "pending"]))
                .await?,
        )?;
        let gas_price = quantity_to_u64(&node.request("eth_gasPrice", json!([])).await?)?;
        let estimate = quantity_to_u64(
            &node
                .request(
                    "eth_estimateGas",
                    json!([{ "from": from, "to": to, "value": value, "data": data }]),
                )
                .await?,
        )?;

        let mut tx = TxLegacy {
            chain_id: Some(chain_id),
            nonce,
            gas_price: u128::from(gas_price),
            gas_limit: with_headroom(estimate),
            to: TxKind::Call(to),
            value,
            input: data,
        };
        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| PortError::Transport(format!("failed to sign transaction: {e}")))?;
        let raw = TxEnvelope::from(tx.into_signed(signature)).encoded_2718();
        tracing::debug!(%from, %to, nonce, chain_id, "broadcasting locally signed transaction");
        let result = node
            .request("eth_sendRawTransaction", json!([Bytes::from(raw)]))
            .await?;
        hex_hash(&result)
    }
}

#[async_trait]
impl SigningProvider for Eip1193Signer {
    async fn address(&self) -> Result<Address, PortError> {
        match &self.mode {
            SignerMode::Proxy { wallet, account } => Self::proxy_account(wallet, account).await,
            SignerMode::Local { signer, .. } => Ok(signer.address()),
            SignerMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        let rpc = match &self.mode {
            SignerMode::Proxy { wallet, .. } => wallet,
            SignerMode::Local { node, .. } => node,
            SignerMode::Disabled(reason) => return Err(PortError::Policy(reason.clone())),
        };
        quantity_to_u64(&rpc.request("eth_chainId", json!([])).await?)
    }

    /// Local keys sign the digest directly (`v` 27/28). Wallets only offer `eth_sign`,
    /// which prefixes the digest, so their signatures come back with `v` 31/32.
    async fn sign_digest(&self, digest: B256) -> Result<Bytes, PortError> {
        match &self.mode {
            SignerMode::Local { signer, .. } => {
                let sig = signer
                    .sign_hash_sync(&digest)
                    .map_err(|e| PortError::Transport(format!("failed to sign digest: {e}")))?;
                Ok(Bytes::copy_from_slice(&sig.as_bytes()))
            }
            SignerMode::Proxy { wallet, account } => {
                let from = Self::proxy_account(wallet, account).await?;
                let result = wallet.request("eth_sign", json!([from, digest])).await?;
                let raw = hex_bytes(&result)?;
                eth_sign_to_safe_signature(&raw)
            }
            SignerMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<B256, PortError> {
        match &self.mode {
            SignerMode::Local { signer, node } => {
                Self::send_local(signer, node, to, value, data).await
            }
            SignerMode::Proxy { wallet, account } => {
                let from = Self::proxy_account(wallet, account).await?;
                let result = wallet
                    .request(
                        "eth_sendTransaction",
                        json!([{ "from": from, "to": to, "value": value, "data": data }]),
                    )
                    .await?;
                hex_hash(&result)
            }
            SignerMode::Disabled(reason) => Err(PortError::Policy(reason.clone())),
        }
    }
}

/// Normalizes an `eth_sign` result to the account's prefixed-message form (`v` + 4).
fn eth_sign_to_safe_signature(raw: &[u8]) -> Result<Bytes, PortError> {
    if raw.len() != 65 {
        return Err(PortError::Validation(format!(
            "eth_sign returned {} bytes, expected 65",
            raw.len()
        )));
    }
    let mut out = raw.to_vec();
    out[64] = match out[64] {
        0 | 1 => out[64] + 31,
        27 | 28 => out[64] + 4,
        v => {
            return Err(PortError::Validation(format!(
                "eth_sign returned unsupported v {v}"
            )))
        }
    };
    Ok(out.into())
}

fn with_headroom(estimate: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(GAS_HEADROOM_PERCENT) / 100)
}
