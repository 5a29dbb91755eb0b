//! Packed MultiSend batches: `operation(1) ‖ to(20) ‖ value(32) ‖ dataLength(32) ‖ data` per call.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::contracts::IMultiSend;
use crate::domain::{Operation, SafeTransaction};
use crate::error::CoreError;

const HEADER_LEN: usize = 1 + 20 + 32 + 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSendCall {
    pub operation: Operation,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl MultiSendCall {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            operation: Operation::Call,
            to,
            value: U256::ZERO,
            data: data.into(),
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.operation.as_u8());
        out.extend_from_slice(self.to.as_slice());
        out.extend_from_slice(&self.value.to_be_bytes::<32>());
        out.extend_from_slice(&U256::from(self.data.len()).to_be_bytes::<32>());
        out.extend_from_slice(&self.data);
    }
}

pub fn encode_multisend(calls: &[MultiSendCall]) -> Bytes {
    let mut out = Vec::with_capacity(calls.iter().map(|c| HEADER_LEN + c.data.len()).sum());
    for call in calls {
        call.encode_into(&mut out);
    }
    out.into()
}

pub fn decode_multisend(packed: &[u8]) -> Result<Vec<MultiSendCall>, CoreError> {
    let mut calls = Vec::new();
    let mut rest = packed;
    while !rest.is_empty() {
        if rest.len() < HEADER_LEN {
            return Err(CoreError::validation(format!(
                "truncated multisend entry: {} trailing bytes",
                rest.len()
            )));
        }
        let operation = Operation::from_u8(rest[0])?;
        let to = Address::from_slice(&rest[1..21]);
        let value = U256::from_be_slice(&rest[21..53]);
        let len = U256::from_be_slice(&rest[53..85]);
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= rest.len() - HEADER_LEN)
            .ok_or_else(|| CoreError::validation("multisend data length exceeds payload"))?;
        let data = Bytes::copy_from_slice(&rest[HEADER_LEN..HEADER_LEN + len]);
        calls.push(MultiSendCall {
            operation,
            to,
            value,
            data,
        });
        rest = &rest[HEADER_LEN + len..];
    }
    Ok(calls)
}

/// Decodes full `multiSend(bytes)` calldata.
pub fn decode_multisend_calldata(calldata: &[u8]) -> Result<Vec<MultiSendCall>, CoreError> {
    let call = IMultiSend::multiSendCall::abi_decode(calldata, true)
        .map_err(|e| CoreError::validation(format!("not multiSend calldata: {e}")))?;
    decode_multisend(&call.transactions)
}

/// Account transaction that delegatecalls the MultiSend helper with `calls`.
pub fn multisend_transaction(multi_send: Address, calls: &[MultiSendCall]) -> SafeTransaction {
    let data = IMultiSend::multiSendCall {
        transactions: encode_multisend(calls),
    }
    .abi_encode();
    SafeTransaction::new(multi_send, U256::ZERO, data, Operation::DelegateCall)
}
