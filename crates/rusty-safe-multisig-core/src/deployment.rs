//! Counterfactual account deployment: address prediction and the step runner.

use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;

use crate::contracts::{ContractSet, ISafe, ISafeProxyFactory};
use crate::domain::{SafeAccountConfig, UndeployedSafe};
use crate::error::CoreError;
use crate::ports::{AccountRegistry, ChainReader, SigningProvider};
use crate::state_machine::{
    deployment_transition, DeploymentEvent, DeploymentState, StateTransition, StepRecord,
};

/// Transaction that deploys the proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentCall {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// `setup(owners, threshold, 0x0, 0x, fallbackHandler, 0x0, 0, 0x0)`
pub fn encode_setup(config: &SafeAccountConfig, default_fallback_handler: Address) -> Bytes {
    ISafe::setupCall {
        owners: config.owners.clone(),
        threshold: U256::from(config.threshold),
        to: Address::ZERO,
        data: Bytes::new(),
        fallbackHandler: config.fallback_handler.unwrap_or(default_fallback_handler),
        paymentToken: Address::ZERO,
        payment: U256::ZERO,
        paymentReceiver: Address::ZERO,
    }
    .abi_encode()
    .into()
}

/// `keccak256(proxyCreationCode ‖ uint256(singleton))`
pub fn init_code_hash(creation_code: &[u8], singleton: Address) -> B256 {
    let mut init_code = Vec::with_capacity(creation_code.len() + 32);
    init_code.extend_from_slice(creation_code);
    init_code.extend_from_slice(&[0u8; 12]);
    init_code.extend_from_slice(singleton.as_slice());
    keccak256(init_code)
}

/// CREATE2 address of a proxy, salted with `keccak256(keccak256(initializer) ‖ saltNonce)`.
pub fn predict_address(
    factory: Address,
    init_code_hash: B256,
    initializer: &[u8],
    salt_nonce: U256,
) -> Address {
    let mut salt_input = [0u8; 64];
    salt_input[..32].copy_from_slice(keccak256(initializer).as_slice());
    salt_input[32..].copy_from_slice(&salt_nonce.to_be_bytes::<32>());
    let salt = keccak256(salt_input);
    factory.create2(salt, init_code_hash)
}

pub fn deployment_call(contracts: &ContractSet, initializer: Bytes, salt_nonce: U256) -> DeploymentCall {
    DeploymentCall {
        to: contracts.proxy_factory,
        value: U256::ZERO,
        data: ISafeProxyFactory::createProxyWithNonceCall {
            singleton: contracts.singleton,
            initializer,
            saltNonce: salt_nonce,
        }
        .abi_encode()
        .into(),
    }
}

/// Reads the factory's proxy creation code and predicts where `safe` deploys.
pub async fn predict_undeployed<C: ChainReader + ?Sized>(
    chain: &C,
    contracts: &ContractSet,
    safe: &UndeployedSafe,
) -> Result<(Address, Bytes), CoreError> {
    let raw = chain
        .call(
            contracts.proxy_factory,
            ISafeProxyFactory::proxyCreationCodeCall {}.abi_encode().into(),
        )
        .await?;
    let creation_code = ISafeProxyFactory::proxyCreationCodeCall::abi_decode_returns(&raw, true)
        .map_err(|e| CoreError::Chain(format!("decode proxyCreationCode: {e}")))?
        ._0;
    let initializer = encode_setup(&safe.safe_account_config, contracts.fallback_handler);
    let predicted = predict_address(
        contracts.proxy_factory,
        init_code_hash(&creation_code, contracts.singleton),
        &initializer,
        safe.safe_deployment_config.salt_nonce,
    );
    Ok((predicted, initializer))
}

/// Result of one deployment attempt.
#[derive(Debug, Clone)]
pub struct DeploymentExecution {
    pub state: DeploymentState,
    pub transitions: Vec<StateTransition>,
}

impl DeploymentExecution {
    fn new() -> Self {
        Self {
            state: DeploymentState::Idle,
            transitions: Vec::new(),
        }
    }

    pub fn steps(&self) -> Vec<StepRecord> {
        self.state.steps()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, DeploymentState::Success { .. })
    }

    fn apply(&mut self, event: DeploymentEvent) -> Result<(), CoreError> {
        let state = std::mem::replace(&mut self.state, DeploymentState::Idle);
        let (next, transition) = deployment_transition(state, event)?;
        tracing::info!(from = ?transition.from, to = ?transition.to, reason = transition.reason, "deployment step");
        self.state = next;
        self.transitions.push(transition);
        Ok(())
    }

    fn fail(&mut self, err: CoreError) -> Result<(), CoreError> {
        tracing::warn!(error = %err, "deployment step failed");
        self.apply(DeploymentEvent::Failed {
            message: err.to_string(),
        })
    }
}

/// Runs Build → Broadcast → Confirm → VerifyDeployed for an undeployed account.
///
/// Every attempt starts from `Idle`. A failing step halts the attempt; no step is retried.
pub struct DeploymentOrchestrator<'a, C: ?Sized, P: ?Sized, R: ?Sized> {
    pub chain: &'a C,
    pub signer: &'a P,
    pub registry: &'a R,
    pub contracts: ContractSet,
    pub receipt_timeout: Duration,
}

impl<'a, C, P, R> DeploymentOrchestrator<'a, C, P, R>
where
    C: ChainReader + ?Sized,
    P: SigningProvider + ?Sized,
    R: AccountRegistry + ?Sized,
{
    pub fn new(
        chain: &'a C,
        signer: &'a P,
        registry: &'a R,
        contracts: ContractSet,
        receipt_timeout: Duration,
    ) -> Self {
        Self {
            chain,
            signer,
            registry,
            contracts,
            receipt_timeout,
        }
    }

    /// Only an illegal state transition is returned as `Err`; step failures end in
    /// `DeploymentState::Error`.
    pub async fn deploy(&self, safe: &UndeployedSafe) -> Result<DeploymentExecution, CoreError> {
        let mut exec = DeploymentExecution::new();
        exec.apply(DeploymentEvent::Start)?;

        let (predicted, call) = match self.build(safe).await {
            Ok(built) => built,
            Err(err) => {
                exec.fail(err)?;
                return Ok(exec);
            }
        };
        exec.apply(DeploymentEvent::Built {
            predicted,
            call: call.clone(),
        })?;

        let tx_hash = match self
            .signer
            .send_transaction(call.to, call.value, call.data.clone())
            .await
        {
            Ok(hash) => hash,
            Err(err) => {
                exec.fail(err.into())?;
                return Ok(exec);
            }
        };
        exec.apply(DeploymentEvent::Broadcast { tx_hash })?;

        match self.chain.wait_for_receipt(tx_hash, self.receipt_timeout).await {
            Ok(receipt) if receipt.success => exec.apply(DeploymentEvent::Confirmed)?,
            Ok(_) => {
                exec.fail(CoreError::Chain(format!("deployment {tx_hash} reverted")))?;
                return Ok(exec);
            }
            Err(err) => {
                exec.fail(err.into())?;
                return Ok(exec);
            }
        }

        if let Err(err) = self.verify(safe, predicted).await {
            exec.fail(err)?;
            return Ok(exec);
        }
        exec.apply(DeploymentEvent::Verified)?;
        Ok(exec)
    }

    async fn build(&self, safe: &UndeployedSafe) -> Result<(Address, DeploymentCall), CoreError> {
        let chain_id = self.signer.chain_id().await?;
        if chain_id != safe.chain_id {
            return Err(CoreError::validation(format!(
                "signer is on chain {chain_id}, account is configured for chain {}",
                safe.chain_id
            )));
        }
        let (predicted, initializer) = predict_undeployed(self.chain, &self.contracts, safe).await?;
        if predicted != safe.address {
            return Err(CoreError::validation(format!(
                "predicted address {predicted} does not match configured address {}",
                safe.address
            )));
        }
        let call = deployment_call(
            &self.contracts,
            initializer,
            safe.safe_deployment_config.salt_nonce,
        );
        Ok((predicted, call))
    }

    async fn verify(&self, safe: &UndeployedSafe, predicted: Address) -> Result<(), CoreError> {
        let code = self.chain.code_at(predicted).await?;
        if code.is_empty() {
            return Err(CoreError::Chain(format!("no code at {predicted} after deployment")));
        }
        self.registry.mark_deployed(safe.chain_id, predicted)?;
        Ok(())
    }
}
