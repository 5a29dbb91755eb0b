use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::deployment::DeploymentCall;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentStep {
    Build,
    Broadcast,
    Confirm,
    VerifyDeployed,
}

impl DeploymentStep {
    pub const ALL: [DeploymentStep; 4] = [
        DeploymentStep::Build,
        DeploymentStep::Broadcast,
        DeploymentStep::Confirm,
        DeploymentStep::VerifyDeployed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Build => "Build deployment transaction",
            Self::Broadcast => "Broadcast deployment",
            Self::Confirm => "Wait for confirmation",
            Self::VerifyDeployed => "Verify account code",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub step: DeploymentStep,
    pub name: &'static str,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentPhase {
    Idle,
    BuildingDeploymentTx,
    Broadcasting,
    Confirming,
    VerifyingDeployed,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    Idle,
    BuildingDeploymentTx,
    Broadcasting {
        predicted: Address,
        call: DeploymentCall,
    },
    Confirming {
        predicted: Address,
        tx_hash: B256,
    },
    VerifyingDeployed {
        predicted: Address,
        tx_hash: B256,
    },
    Success {
        address: Address,
        tx_hash: B256,
    },
    Error {
        step: DeploymentStep,
        message: String,
        predicted: Option<Address>,
        tx_hash: Option<B256>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEvent {
    Start,
    Built {
        predicted: Address,
        call: DeploymentCall,
    },
    Broadcast {
        tx_hash: B256,
    },
    Confirmed,
    Verified,
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: DeploymentPhase,
    pub to: DeploymentPhase,
    pub reason: &'static str,
}

impl DeploymentState {
    pub fn phase(&self) -> DeploymentPhase {
        match self {
            Self::Idle => DeploymentPhase::Idle,
            Self::BuildingDeploymentTx => DeploymentPhase::BuildingDeploymentTx,
            Self::Broadcasting { .. } => DeploymentPhase::Broadcasting,
            Self::Confirming { .. } => DeploymentPhase::Confirming,
            Self::VerifyingDeployed { .. } => DeploymentPhase::VerifyingDeployed,
            Self::Success { .. } => DeploymentPhase::Success,
            Self::Error { .. } => DeploymentPhase::Error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error { .. })
    }

    /// Step that is running in this state, if any.
    pub fn current_step(&self) -> Option<DeploymentStep> {
        match self {
            Self::BuildingDeploymentTx => Some(DeploymentStep::Build),
            Self::Broadcasting { .. } => Some(DeploymentStep::Broadcast),
            Self::Confirming { .. } => Some(DeploymentStep::Confirm),
            Self::VerifyingDeployed { .. } => Some(DeploymentStep::VerifyDeployed),
            _ => None,
        }
    }

    pub fn tx_hash(&self) -> Option<B256> {
        match self {
            Self::Confirming { tx_hash, .. }
            | Self::VerifyingDeployed { tx_hash, .. }
            | Self::Success { tx_hash, .. } => Some(*tx_hash),
            Self::Error { tx_hash, .. } => *tx_hash,
            _ => None,
        }
    }

    /// Per-step view of this state. Steps before the current one succeeded,
    /// steps after it are pending.
    pub fn steps(&self) -> Vec<StepRecord> {
        let (reached, current_status, error) = match self {
            Self::Idle => (0, StepStatus::Pending, None),
            Self::Success { .. } => (DeploymentStep::ALL.len(), StepStatus::Success, None),
            Self::Error { step, message, .. } => {
                (step.index(), StepStatus::Error, Some(message.clone()))
            }
            running => (
                running.current_step().map_or(0, DeploymentStep::index),
                StepStatus::Running,
                None,
            ),
        };
        let tx_hash = self.tx_hash();
        DeploymentStep::ALL
            .iter()
            .map(|&step| {
                let idx = step.index();
                let status = if idx < reached {
                    StepStatus::Success
                } else if idx == reached {
                    current_status
                } else {
                    StepStatus::Pending
                };
                let carries_hash = matches!(step, DeploymentStep::Broadcast | DeploymentStep::Confirm)
                    && idx <= reached;
                StepRecord {
                    step,
                    name: step.name(),
                    status,
                    error: (idx == reached).then(|| error.clone()).flatten(),
                    tx_hash: if carries_hash { tx_hash } else { None },
                }
            })
            .collect()
    }
}

pub fn deployment_transition(
    state: DeploymentState,
    event: DeploymentEvent,
) -> Result<(DeploymentState, StateTransition), CoreError> {
    use DeploymentEvent as E;
    use DeploymentState as S;

    let from = state.phase();
    let (next, reason) = match (state, event) {
        (S::Idle, E::Start) => (S::BuildingDeploymentTx, "start"),
        (S::BuildingDeploymentTx, E::Built { predicted, call }) => {
            (S::Broadcasting { predicted, call }, "deployment transaction built")
        }
        (S::Broadcasting { predicted, .. }, E::Broadcast { tx_hash }) => {
            (S::Confirming { predicted, tx_hash }, "deployment broadcast")
        }
        (S::Confirming { predicted, tx_hash }, E::Confirmed) => {
            (S::VerifyingDeployed { predicted, tx_hash }, "receipt confirmed")
        }
        (S::VerifyingDeployed { predicted, tx_hash }, E::Verified) => (
            S::Success {
                address: predicted,
                tx_hash,
            },
            "account code present",
        ),
        (state, E::Failed { message }) if state.current_step().is_some() => {
            let predicted = match &state {
                S::Broadcasting { predicted, .. }
                | S::Confirming { predicted, .. }
                | S::VerifyingDeployed { predicted, .. } => Some(*predicted),
                _ => None,
            };
            let tx_hash = state.tx_hash();
            let step = state.current_step().unwrap_or(DeploymentStep::Build);
            (
                S::Error {
                    step,
                    message,
                    predicted,
                    tx_hash,
                },
                "step failed",
            )
        }
        (state, event) => {
            return Err(CoreError::IllegalTransition(format!(
                "illegal deployment transition: {:?} on {event:?}",
                state.phase()
            )))
        }
    };
    let transition = StateTransition {
        from,
        to: next.phase(),
        reason,
    };
    Ok((next, transition))
}
