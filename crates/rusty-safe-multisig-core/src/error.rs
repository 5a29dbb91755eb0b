use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::PortError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("owner not found: {0}")]
    OwnerNotFound(Address),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("chain error: {0}")]
    Chain(String),
    #[error("stale request: {0}")]
    StaleRequest(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("illegal transition: {0}")]
    IllegalTransition(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<PortError> for CoreError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Validation(msg) => Self::Validation(msg),
            PortError::NotFound(msg) => Self::NotFound(msg),
            PortError::Policy(msg) => Self::Validation(format!("policy: {msg}")),
            PortError::NotImplemented(what) => Self::Chain(format!("port not implemented: {what}")),
            PortError::Transport(msg) => Self::Chain(msg),
        }
    }
}

/// Advisory conflicts. The operation that produced them still succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConflictWarning {
    NonceAlreadyExecuted { nonce: u64, on_chain_nonce: u64 },
    NonceAlreadyQueued { nonce: u64 },
}

impl ConflictWarning {
    pub fn message(&self) -> String {
        match self {
            Self::NonceAlreadyExecuted {
                nonce,
                on_chain_nonce,
            } => format!(
                "nonce {nonce} was already executed on-chain (current nonce {on_chain_nonce})"
            ),
            Self::NonceAlreadyQueued { nonce } => {
                format!("nonce {nonce} is already queued and will be replaced")
            }
        }
    }
}
