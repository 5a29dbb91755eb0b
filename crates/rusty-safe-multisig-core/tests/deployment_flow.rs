mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

use rusty_safe_multisig_core::contracts::ISafeProxyFactory;
use rusty_safe_multisig_core::{
    encode_setup, init_code_hash, predict_address, AccountRegistry, AccountStateReader, ContractSet,
    DeploymentOrchestrator, DeploymentState, DeploymentStep, SafeAccountConfig,
    SafeDeploymentConfig, SafeVersion, StepStatus, UndeployedSafe,
};

use common::{
    deployed_chain, owner_address, safe_address, ChainState, MockChain, MockRegistry, MockSigner,
    SharedChain, CHAIN_ID,
};

fn undeployed(state: &SharedChain) -> UndeployedSafe {
    let contracts = ContractSet::default();
    let config = SafeAccountConfig {
        owners: (0..3).map(owner_address).collect(),
        threshold: 2,
        fallback_handler: None,
    };
    let salt_nonce = U256::from(7);
    let creation_code = state.lock().expect("chain lock").proxy_creation_code.clone();
    let address = predict_address(
        contracts.proxy_factory,
        init_code_hash(&creation_code, contracts.singleton),
        &encode_setup(&config, contracts.fallback_handler),
        salt_nonce,
    );
    UndeployedSafe {
        chain_id: CHAIN_ID,
        address,
        safe_account_config: config,
        safe_deployment_config: SafeDeploymentConfig {
            salt_nonce,
            safe_version: SafeVersion::default(),
        },
    }
}

fn fresh_chain() -> SharedChain {
    Arc::new(Mutex::new(ChainState::default()))
}

#[tokio::test]
async fn failed_broadcast_then_retry_deploys_at_same_address() {
    let state = fresh_chain();
    let safe = undeployed(&state);
    state.lock().expect("chain lock").deploy_to = Some(safe.address);
    state.lock().expect("chain lock").fail_send = Some("user rejected the request".to_owned());

    let chain = MockChain::new(state.clone());
    let signer = MockSigner::new(0, state.clone());
    let registry = MockRegistry::with(safe.clone());
    let runner = DeploymentOrchestrator::new(
        &chain,
        &signer,
        &registry,
        ContractSet::default(),
        Duration::from_secs(1),
    );

    let first = runner.deploy(&safe).await.expect("attempt runs");
    assert!(!first.is_success());
    let statuses: Vec<StepStatus> = first.steps().iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Success,
            StepStatus::Error,
            StepStatus::Pending,
            StepStatus::Pending
        ]
    );
    assert!(first.steps().iter().all(|s| s.tx_hash.is_none()));
    assert!(matches!(
        &first.state,
        DeploymentState::Error { step: DeploymentStep::Broadcast, predicted: Some(p), .. } if *p == safe.address
    ));
    assert!(registry.deployed.lock().expect("registry lock").is_empty());

    let second = runner.deploy(&safe).await.expect("retry runs");
    assert!(second.is_success());
    assert_eq!(
        second.state,
        DeploymentState::Success {
            address: safe.address,
            tx_hash: second.state.tx_hash().expect("tx hash"),
        }
    );
    assert_eq!(second.transitions.len(), 5);
    assert_eq!(
        *registry.deployed.lock().expect("registry lock"),
        vec![(CHAIN_ID, safe.address)]
    );
    assert!(registry
        .load_undeployed(CHAIN_ID, safe.address)
        .expect("registry read")
        .is_none());

    let sent = state.lock().expect("chain lock").sent.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, ContractSet::default().proxy_factory);
    let call = ISafeProxyFactory::createProxyWithNonceCall::abi_decode(&sent[0].data, true)
        .expect("createProxyWithNonce calldata");
    assert_eq!(call.singleton, ContractSet::default().singleton);
    assert_eq!(call.saltNonce, U256::from(7));
    assert_eq!(
        call.initializer,
        encode_setup(&safe.safe_account_config, ContractSet::default().fallback_handler)
    );
}

#[tokio::test]
async fn mismatched_configured_address_fails_build() {
    let state = fresh_chain();
    let mut safe = undeployed(&state);
    safe.address = Address::repeat_byte(0x42);

    let chain = MockChain::new(state.clone());
    let signer = MockSigner::new(0, state.clone());
    let registry = MockRegistry::with(safe.clone());
    let exec = DeploymentOrchestrator::new(
        &chain,
        &signer,
        &registry,
        ContractSet::default(),
        Duration::from_secs(1),
    )
    .deploy(&safe)
    .await
    .expect("attempt runs");

    let steps = exec.steps();
    assert_eq!(steps[0].status, StepStatus::Error);
    assert!(steps[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("does not match configured address")));
    assert!(state.lock().expect("chain lock").sent.is_empty());
}

#[tokio::test]
async fn signer_on_wrong_chain_fails_build() {
    let state = fresh_chain();
    let safe = undeployed(&state);
    let chain = MockChain::new(state.clone());
    let mut signer = MockSigner::new(0, state.clone());
    signer.chain_id = 100;
    let registry = MockRegistry::with(safe.clone());

    let exec = DeploymentOrchestrator::new(
        &chain,
        &signer,
        &registry,
        ContractSet::default(),
        Duration::from_secs(1),
    )
    .deploy(&safe)
    .await
    .expect("attempt runs");
    assert!(matches!(
        exec.state,
        DeploymentState::Error { step: DeploymentStep::Build, .. }
    ));
}

#[tokio::test]
async fn reverted_deployment_fails_confirm_with_hash() {
    let state = fresh_chain();
    let safe = undeployed(&state);
    state.lock().expect("chain lock").revert = true;
    let chain = MockChain::new(state.clone());
    let signer = MockSigner::new(0, state.clone());
    let registry = MockRegistry::with(safe.clone());

    let exec = DeploymentOrchestrator::new(
        &chain,
        &signer,
        &registry,
        ContractSet::default(),
        Duration::from_secs(1),
    )
    .deploy(&safe)
    .await
    .expect("attempt runs");
    let steps = exec.steps();
    assert_eq!(steps[2].status, StepStatus::Error);
    assert!(steps[1].tx_hash.is_some());
    assert!(exec.state.tx_hash().is_some());
}

#[tokio::test]
async fn mined_without_code_fails_verification() {
    let state = fresh_chain();
    let safe = undeployed(&state);
    let chain = MockChain::new(state.clone());
    let signer = MockSigner::new(0, state.clone());
    let registry = MockRegistry::with(safe.clone());

    let exec = DeploymentOrchestrator::new(
        &chain,
        &signer,
        &registry,
        ContractSet::default(),
        Duration::from_secs(1),
    )
    .deploy(&safe)
    .await
    .expect("attempt runs");
    assert_eq!(exec.steps()[3].status, StepStatus::Error);
    assert!(registry.deployed.lock().expect("registry lock").is_empty());
}

#[tokio::test]
async fn state_reader_uses_local_record_until_deployed() {
    let state = fresh_chain();
    let safe = undeployed(&state);
    let chain = MockChain::new(state.clone());
    let registry = MockRegistry::with(safe.clone());
    let reader = AccountStateReader::new(&chain, &registry);

    let local = reader.read(CHAIN_ID, safe.address).await.expect("undeployed state");
    assert!(!local.deployed);
    assert_eq!(local.nonce, 0);
    assert_eq!(local.threshold, 2);
    assert_eq!(local.owners, safe.safe_account_config.owners);

    let err = reader
        .read(CHAIN_ID, Address::repeat_byte(0x77))
        .await
        .expect_err("unknown account");
    assert!(err.to_string().contains("no undeployed record"));
}

#[tokio::test]
async fn state_reader_reads_deployed_account() {
    let state = deployed_chain();
    {
        let mut chain_state = state.lock().expect("chain lock");
        chain_state.nonce = 12;
        chain_state.version = "1.3.0+L2".to_owned();
        chain_state
            .balances
            .insert(safe_address(), U256::from(5_000));
    }
    let chain = MockChain::new(state);
    let registry = MockRegistry::default();
    let reader = AccountStateReader::new(&chain, &registry);

    let account = reader.read(CHAIN_ID, safe_address()).await.expect("state");
    assert!(account.deployed);
    assert_eq!(account.nonce, 12);
    assert_eq!(account.threshold, 2);
    assert_eq!(account.owners.len(), 3);
    assert_eq!(account.version.as_str(), "1.3.0+L2");
    assert!(account.version.has_chain_id_domain());
    assert_eq!(
        reader.balance(safe_address()).await.expect("balance"),
        U256::from(5_000)
    );
}
