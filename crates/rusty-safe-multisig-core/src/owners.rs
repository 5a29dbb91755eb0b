//! Owner-set changes encoded against the account's sentinel-headed owners list.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::contracts::{ISafe, SENTINEL_OWNERS};
use crate::domain::{Operation, SafeTransaction};
use crate::error::CoreError;
use crate::multisend::{multisend_transaction, MultiSendCall};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "camelCase")]
pub enum OwnerChange {
    Add(Address),
    Remove(Address),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerOperation {
    AddOwnerWithThreshold {
        owner: Address,
        threshold: u64,
    },
    RemoveOwner {
        prev_owner: Address,
        owner: Address,
        threshold: u64,
    },
    SwapOwner {
        prev_owner: Address,
        old_owner: Address,
        new_owner: Address,
    },
    ChangeThreshold {
        threshold: u64,
    },
}

impl OwnerOperation {
    pub fn calldata(&self) -> Bytes {
        let data = match *self {
            Self::AddOwnerWithThreshold { owner, threshold } => ISafe::addOwnerWithThresholdCall {
                owner,
                threshold: U256::from(threshold),
            }
            .abi_encode(),
            Self::RemoveOwner {
                prev_owner,
                owner,
                threshold,
            } => ISafe::removeOwnerCall {
                prevOwner: prev_owner,
                owner,
                threshold: U256::from(threshold),
            }
            .abi_encode(),
            Self::SwapOwner {
                prev_owner,
                old_owner,
                new_owner,
            } => ISafe::swapOwnerCall {
                prevOwner: prev_owner,
                oldOwner: old_owner,
                newOwner: new_owner,
            }
            .abi_encode(),
            Self::ChangeThreshold { threshold } => ISafe::changeThresholdCall {
                threshold: U256::from(threshold),
            }
            .abi_encode(),
        };
        data.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerPlan {
    pub operations: Vec<OwnerOperation>,
    pub final_owners: Vec<Address>,
    pub final_threshold: u64,
}

impl OwnerPlan {
    /// One operation is a direct call on the account; more are batched through MultiSend.
    /// The returned transaction carries nonce 0 until the caller assigns one.
    pub fn to_transaction(&self, account: Address, multi_send: Address) -> Result<SafeTransaction, CoreError> {
        match self.operations.as_slice() {
            [] => Err(CoreError::validation("owner plan is empty")),
            [single] => Ok(SafeTransaction::new(
                account,
                U256::ZERO,
                single.calldata(),
                Operation::Call,
            )),
            many => {
                let calls: Vec<MultiSendCall> = many
                    .iter()
                    .map(|op| MultiSendCall::call(account, op.calldata()))
                    .collect();
                Ok(multisend_transaction(multi_send, &calls))
            }
        }
    }
}

/// Predecessor of `owner` in the linked list; the sentinel for the head.
pub fn prev_owner(owners: &[Address], owner: Address) -> Result<Address, CoreError> {
    let idx = owners
        .iter()
        .position(|o| *o == owner)
        .ok_or(CoreError::OwnerNotFound(owner))?;
    Ok(if idx == 0 { SENTINEL_OWNERS } else { owners[idx - 1] })
}

/// Orders the calls that turn (`owners`, `threshold`) into the requested owner set.
///
/// Removals run first against a simulated list so each `prevOwner` matches the
/// on-chain list at call time; a threshold change is always the last call.
pub fn plan_owner_changes(
    owners: &[Address],
    threshold: u64,
    changes: &[OwnerChange],
    new_threshold: u64,
) -> Result<OwnerPlan, CoreError> {
    let mut removals = Vec::new();
    let mut additions = Vec::new();
    for change in changes {
        let address = match *change {
            OwnerChange::Add(address) | OwnerChange::Remove(address) => address,
        };
        if address == Address::ZERO || address == SENTINEL_OWNERS {
            return Err(CoreError::validation(format!("invalid owner address {address}")));
        }
        if removals.contains(&address) || additions.contains(&address) {
            return Err(CoreError::validation(format!("owner {address} changed more than once")));
        }
        match change {
            OwnerChange::Add(_) => additions.push(address),
            OwnerChange::Remove(_) => removals.push(address),
        }
    }
    for removed in &removals {
        if !owners.contains(removed) {
            return Err(CoreError::OwnerNotFound(*removed));
        }
    }
    for added in &additions {
        if owners.contains(added) {
            return Err(CoreError::validation(format!("{added} is already an owner")));
        }
    }

    let final_count = owners.len() - removals.len() + additions.len();
    if new_threshold < 1 || new_threshold > final_count as u64 {
        return Err(CoreError::validation(format!(
            "threshold {new_threshold} out of range 1..={final_count}"
        )));
    }
    if removals.is_empty() && additions.is_empty() && new_threshold == threshold {
        return Err(CoreError::validation("no owner or threshold change requested"));
    }

    let mut simulated = owners.to_vec();
    let mut sim_threshold = threshold;
    let mut operations = Vec::new();

    if let ([old_owner], [new_owner]) = (removals.as_slice(), additions.as_slice()) {
        let prev = prev_owner(&simulated, *old_owner)?;
        operations.push(OwnerOperation::SwapOwner {
            prev_owner: prev,
            old_owner: *old_owner,
            new_owner: *new_owner,
        });
        if let Some(slot) = simulated.iter_mut().find(|o| **o == *old_owner) {
            *slot = *new_owner;
        }
    } else {
        if removals.len() >= owners.len() {
            return Err(CoreError::validation(
                "cannot remove every current owner before new owners are added",
            ));
        }
        for removed in &removals {
            let prev = prev_owner(&simulated, *removed)?;
            simulated.retain(|o| o != removed);
            sim_threshold = sim_threshold.min(simulated.len() as u64);
            operations.push(OwnerOperation::RemoveOwner {
                prev_owner: prev,
                owner: *removed,
                threshold: sim_threshold,
            });
        }
        for added in &additions {
            // addOwner links the new owner at the head of the list.
            simulated.insert(0, *added);
            operations.push(OwnerOperation::AddOwnerWithThreshold {
                owner: *added,
                threshold: sim_threshold,
            });
        }
    }

    if new_threshold != sim_threshold {
        operations.push(OwnerOperation::ChangeThreshold {
            threshold: new_threshold,
        });
    }

    Ok(OwnerPlan {
        operations,
        final_owners: simulated,
        final_threshold: new_threshold,
    })
}
