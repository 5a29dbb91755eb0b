//! Transaction candidates other than raw calldata.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::contracts::{ContractSet, IERC20};
use crate::domain::{AccountState, Operation, SafeTransaction};
use crate::error::CoreError;
use crate::owners::{plan_owner_changes, OwnerChange};
use crate::ports::AbiPort;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransactionDraft {
    /// Fields as given; the nonce is replaced when queued.
    #[serde(rename_all = "camelCase")]
    Raw { transaction: SafeTransaction },
    #[serde(rename_all = "camelCase")]
    NativeTransfer { to: Address, amount: U256 },
    #[serde(rename_all = "camelCase")]
    Erc20Transfer {
        token: Address,
        to: Address,
        amount: U256,
    },
    #[serde(rename_all = "camelCase")]
    ContractCall {
        to: Address,
        value: U256,
        abi_json: String,
        method: String,
        args: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    OwnerChanges {
        changes: Vec<OwnerChange>,
        new_threshold: u64,
    },
}

pub fn native_transfer(to: Address, amount: U256) -> SafeTransaction {
    SafeTransaction::new(to, amount, Bytes::new(), Operation::Call)
}

pub fn erc20_transfer(token: Address, to: Address, amount: U256) -> SafeTransaction {
    let data = IERC20::transferCall { to, amount }.abi_encode();
    SafeTransaction::new(token, U256::ZERO, data, Operation::Call)
}

/// Builds the unsigned transaction for `draft` against the current account state.
pub fn build_transaction<A: AbiPort + ?Sized>(
    draft: &TransactionDraft,
    state: &AccountState,
    contracts: &ContractSet,
    abi: &A,
) -> Result<SafeTransaction, CoreError> {
    match draft {
        TransactionDraft::Raw { transaction } => Ok(transaction.clone()),
        TransactionDraft::NativeTransfer { to, amount } => Ok(native_transfer(*to, *amount)),
        TransactionDraft::Erc20Transfer { token, to, amount } => {
            Ok(erc20_transfer(*token, *to, *amount))
        }
        TransactionDraft::ContractCall {
            to,
            value,
            abi_json,
            method,
            args,
        } => {
            let data = abi.encode_calldata(abi_json, method, args)?;
            Ok(SafeTransaction::new(*to, *value, data, Operation::Call))
        }
        TransactionDraft::OwnerChanges {
            changes,
            new_threshold,
        } => {
            let plan = plan_owner_changes(&state.owners, state.threshold, changes, *new_threshold)?;
            plan.to_transaction(state.address, contracts.multi_send)
        }
    }
}
