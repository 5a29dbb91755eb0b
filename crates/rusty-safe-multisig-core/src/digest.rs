//! EIP-712 hashing for SafeTx and SafeMessage.

use alloy::dyn_abi::TypedData;
use alloy::primitives::{eip191_hash_message, keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

use crate::contracts::{legacy, SafeMessage, SafeTx};
use crate::domain::{SafeMessagePayload, SafeTransaction, SafeVersion};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeHashes {
    pub domain_hash: B256,
    pub struct_hash: B256,
    pub digest: B256,
}

impl SafeHashes {
    fn new(domain_hash: B256, struct_hash: B256) -> Self {
        Self {
            domain_hash,
            struct_hash,
            digest: eip712_digest(domain_hash, struct_hash),
        }
    }
}

/// Everything needed to bind a digest to one account on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestContext {
    pub chain_id: u64,
    pub account: Address,
    pub version: SafeVersion,
}

impl DigestContext {
    pub fn new(chain_id: u64, account: Address, version: SafeVersion) -> Self {
        Self {
            chain_id,
            account,
            version,
        }
    }

    pub fn eip712_domain(&self) -> Eip712Domain {
        let chain_id = self
            .version
            .has_chain_id_domain()
            .then(|| U256::from(self.chain_id));
        Eip712Domain::new(None, None, chain_id, Some(self.account), None)
    }

    pub fn domain_hash(&self) -> B256 {
        self.eip712_domain().hash_struct()
    }
}

pub fn eip712_digest(domain_hash: B256, struct_hash: B256) -> B256 {
    let mut buf = [0u8; 66];
    buf[0] = 0x19;
    buf[1] = 0x01;
    buf[2..34].copy_from_slice(domain_hash.as_slice());
    buf[34..66].copy_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

pub fn safe_tx_struct_hash(tx: &SafeTransaction, version: &SafeVersion) -> B256 {
    if version.uses_data_gas() {
        return legacy::SafeTx {
            to: tx.to,
            value: tx.value,
            data: tx.data.clone(),
            operation: tx.operation.as_u8(),
            safeTxGas: tx.safe_tx_gas,
            dataGas: tx.base_gas,
            gasPrice: tx.gas_price,
            gasToken: tx.gas_token,
            refundReceiver: tx.refund_receiver,
            nonce: U256::from(tx.nonce),
        }
        .eip712_hash_struct();
    }
    SafeTx {
        to: tx.to,
        value: tx.value,
        data: tx.data.clone(),
        operation: tx.operation.as_u8(),
        safeTxGas: tx.safe_tx_gas,
        baseGas: tx.base_gas,
        gasPrice: tx.gas_price,
        gasToken: tx.gas_token,
        refundReceiver: tx.refund_receiver,
        nonce: U256::from(tx.nonce),
    }
    .eip712_hash_struct()
}

pub fn safe_tx_hashes(tx: &SafeTransaction, ctx: &DigestContext) -> SafeHashes {
    SafeHashes::new(ctx.domain_hash(), safe_tx_struct_hash(tx, &ctx.version))
}

/// The 32-byte value placed in `SafeMessage.message`.
pub fn message_inner_hash(payload: &SafeMessagePayload) -> Result<B256, CoreError> {
    match payload {
        SafeMessagePayload::Raw(text) => Ok(eip191_hash_message(text.as_bytes())),
        SafeMessagePayload::TypedData(typed) => {
            let value = serde_json::to_value(typed)
                .map_err(|e| CoreError::validation(format!("typed data serialize: {e}")))?;
            let typed: TypedData = serde_json::from_value(value)
                .map_err(|e| CoreError::validation(format!("malformed typed data: {e}")))?;
            typed
                .eip712_signing_hash()
                .map_err(|e| CoreError::validation(format!("typed data hashing failed: {e}")))
        }
    }
}

pub fn safe_message_hashes(
    payload: &SafeMessagePayload,
    ctx: &DigestContext,
) -> Result<SafeHashes, CoreError> {
    let inner = message_inner_hash(payload)?;
    let struct_hash = SafeMessage {
        message: Bytes::copy_from_slice(inner.as_slice()),
    }
    .eip712_hash_struct();
    Ok(SafeHashes::new(ctx.domain_hash(), struct_hash))
}
