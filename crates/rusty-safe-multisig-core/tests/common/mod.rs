#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use serde_json::Value;

use rusty_safe_multisig_core::contracts::{ISafe, ISafeProxyFactory};
use rusty_safe_multisig_core::{
    AbiPort, AccountRegistry, ChainReader, ClockPort, KeyValueStore, Orchestrator,
    OrchestratorConfig, PortError, QueueKey, ReceiptSummary, RequestResponder, Signature,
    SigningProvider, UndeployedSafe,
};

pub const CHAIN_ID: u64 = 1;

pub const OWNER_KEYS: [&str; 3] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
];

pub fn owner_signer(idx: usize) -> PrivateKeySigner {
    OWNER_KEYS[idx].parse().expect("valid test key")
}

pub fn owner_address(idx: usize) -> Address {
    owner_signer(idx).address()
}

pub fn safe_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid safe address")
}

pub fn queue_key() -> QueueKey {
    QueueKey::new(safe_address(), CHAIN_ID)
}

/// EOA signature over `digest` by owner `idx`, as a wallet would return it.
pub fn sign(idx: usize, digest: B256) -> Signature {
    let signer = owner_signer(idx);
    let sig = signer.sign_hash_sync(&digest).expect("sign digest");
    Signature::eoa(signer.address(), sig.as_bytes().to_vec()).expect("65-byte signature")
}

#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("kv lock").get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .expect("kv lock")
            .insert(key.to_owned(), value.to_owned());
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, PortError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortError> {
        self.put_raw(key, value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), PortError> {
        self.entries.lock().expect("kv lock").remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentTransaction {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub hash: B256,
}

/// Chain state shared by [`MockChain`] and [`MockSigner`].
#[derive(Debug)]
pub struct ChainState {
    pub owners: Vec<Address>,
    pub threshold: u64,
    pub nonce: u64,
    pub version: String,
    pub code: HashMap<Address, Bytes>,
    pub balances: HashMap<Address, U256>,
    pub proxy_creation_code: Bytes,
    pub receipts: HashMap<B256, ReceiptSummary>,
    pub sent: Vec<SentTransaction>,
    /// Error returned by the next `send_transaction`.
    pub fail_send: Option<String>,
    /// Mined transactions revert while set.
    pub revert: bool,
    /// Code installed here once a transaction is mined.
    pub deploy_to: Option<Address>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            owners: Vec::new(),
            threshold: 1,
            nonce: 0,
            version: "1.4.1".to_owned(),
            code: HashMap::new(),
            balances: HashMap::new(),
            proxy_creation_code: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]),
            receipts: HashMap::new(),
            sent: Vec::new(),
            fail_send: None,
            revert: false,
            deploy_to: None,
        }
    }
}

pub type SharedChain = Arc<Mutex<ChainState>>;

/// Deployed 2-of-3 account owned by the three test keys.
pub fn deployed_chain() -> SharedChain {
    let mut state = ChainState {
        owners: (0..3).map(owner_address).collect(),
        threshold: 2,
        nonce: 0,
        ..ChainState::default()
    };
    state
        .code
        .insert(safe_address(), Bytes::from_static(&[0x60, 0x80]));
    Arc::new(Mutex::new(state))
}

#[derive(Debug, Clone)]
pub struct MockChain {
    pub state: SharedChain,
}

impl MockChain {
    pub fn new(state: SharedChain) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, PortError> {
        let state = self.state.lock().expect("chain lock");
        if data.len() < 4 {
            return Err(PortError::Validation("calldata too short".to_owned()));
        }
        let selector: [u8; 4] = data[..4].try_into().expect("4-byte selector");
        let encoded = if selector == ISafe::getOwnersCall::SELECTOR {
            ISafe::getOwnersCall::abi_encode_returns(&(state.owners.clone(),))
        } else if selector == ISafe::getThresholdCall::SELECTOR {
            ISafe::getThresholdCall::abi_encode_returns(&(U256::from(state.threshold),))
        } else if selector == ISafe::nonceCall::SELECTOR {
            ISafe::nonceCall::abi_encode_returns(&(U256::from(state.nonce),))
        } else if selector == ISafe::VERSIONCall::SELECTOR {
            ISafe::VERSIONCall::abi_encode_returns(&(state.version.clone(),))
        } else if selector == ISafeProxyFactory::proxyCreationCodeCall::SELECTOR {
            ISafeProxyFactory::proxyCreationCodeCall::abi_encode_returns(&(state
                .proxy_creation_code
                .clone(),))
        } else {
            return Err(PortError::NotFound(format!("no handler for call to {to}")));
        };
        Ok(encoded.into())
    }

    async fn code_at(&self, address: Address) -> Result<Bytes, PortError> {
        let state = self.state.lock().expect("chain lock");
        Ok(state.code.get(&address).cloned().unwrap_or_default())
    }

    async fn balance(&self, address: Address) -> Result<U256, PortError> {
        let state = self.state.lock().expect("chain lock");
        Ok(state.balances.get(&address).copied().unwrap_or_default())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, PortError> {
        let state = self.state.lock().expect("chain lock");
        Ok(state.receipts.get(&hash).cloned())
    }

    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
    ) -> Result<ReceiptSummary, PortError> {
        self.transaction_receipt(hash).await?.ok_or_else(|| {
            PortError::Transport(format!("no receipt for {hash} within {timeout:?}"))
        })
    }
}

/// Local key that mines everything it sends into the shared chain state.
pub struct MockSigner {
    pub signer: PrivateKeySigner,
    pub chain_id: u64,
    pub state: SharedChain,
}

impl MockSigner {
    pub fn new(idx: usize, state: SharedChain) -> Self {
        Self {
            signer: owner_signer(idx),
            chain_id: CHAIN_ID,
            state,
        }
    }
}

#[async_trait]
impl SigningProvider for MockSigner {
    async fn address(&self) -> Result<Address, PortError> {
        Ok(self.signer.address())
    }

    async fn chain_id(&self) -> Result<u64, PortError> {
        Ok(self.chain_id)
    }

    async fn sign_digest(&self, digest: B256) -> Result<Bytes, PortError> {
        let sig = self
            .signer
            .sign_hash_sync(&digest)
            .map_err(|e| PortError::Transport(e.to_string()))?;
        Ok(Bytes::copy_from_slice(&sig.as_bytes()))
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<B256, PortError> {
        let mut guard = self.state.lock().expect("chain lock");
        let state = &mut *guard;
        if let Some(message) = state.fail_send.take() {
            return Err(PortError::Transport(message));
        }
        let mut preimage = data.to_vec();
        preimage.extend_from_slice(&(state.sent.len() as u64).to_be_bytes());
        let hash = keccak256(preimage);
        let success = !state.revert;
        if success {
            if data.starts_with(&ISafe::execTransactionCall::SELECTOR) {
                state.nonce += 1;
            }
            if let Some(address) = state.deploy_to {
                state.code.insert(address, Bytes::from_static(&[0x60, 0x80]));
            }
        }
        state.receipts.insert(
            hash,
            ReceiptSummary {
                transaction_hash: hash,
                success,
                block_number: Some(state.sent.len() as u64 + 1),
            },
        );
        state.sent.push(SentTransaction {
            to,
            value,
            data,
            hash,
        });
        Ok(hash)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Approved { id: String, result: Value },
    Rejected { id: String, code: i64, message: String },
}

#[derive(Debug, Default)]
pub struct MockResponder {
    pub responses: Mutex<Vec<Response>>,
    /// Relayer error returned instead of recording the response.
    pub fail_with: Mutex<Option<String>>,
}

impl MockResponder {
    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().expect("responder lock").clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().expect("responder lock") = Some(message.to_owned());
    }

    fn record(&self, response: Response) -> Result<(), PortError> {
        if let Some(message) = self.fail_with.lock().expect("responder lock").clone() {
            return Err(PortError::Transport(message));
        }
        self.responses.lock().expect("responder lock").push(response);
        Ok(())
    }
}

impl RequestResponder for MockResponder {
    fn approve(&self, request_id: &str, result: Value) -> Result<(), PortError> {
        self.record(Response::Approved {
            id: request_id.to_owned(),
            result,
        })
    }

    fn reject(&self, request_id: &str, code: i64, message: &str) -> Result<(), PortError> {
        self.record(Response::Rejected {
            id: request_id.to_owned(),
            code,
            message: message.to_owned(),
        })
    }
}

#[derive(Debug, Default)]
pub struct MockRegistry {
    pub undeployed: Mutex<HashMap<(u64, Address), UndeployedSafe>>,
    pub deployed: Mutex<Vec<(u64, Address)>>,
}

impl MockRegistry {
    pub fn with(safe: UndeployedSafe) -> Self {
        let registry = Self::default();
        registry.save_undeployed(&safe).expect("save undeployed");
        registry
    }
}

impl AccountRegistry for MockRegistry {
    fn load_undeployed(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<UndeployedSafe>, PortError> {
        Ok(self
            .undeployed
            .lock()
            .expect("registry lock")
            .get(&(chain_id, address))
            .cloned())
    }

    fn save_undeployed(&self, safe: &UndeployedSafe) -> Result<(), PortError> {
        self.undeployed
            .lock()
            .expect("registry lock")
            .insert((safe.chain_id, safe.address), safe.clone());
        Ok(())
    }

    fn remove_undeployed(&self, chain_id: u64, address: Address) -> Result<(), PortError> {
        self.undeployed
            .lock()
            .expect("registry lock")
            .remove(&(chain_id, address));
        Ok(())
    }

    fn mark_deployed(&self, chain_id: u64, address: Address) -> Result<(), PortError> {
        self.remove_undeployed(chain_id, address)?;
        self.deployed
            .lock()
            .expect("registry lock")
            .push((chain_id, address));
        Ok(())
    }
}

/// Only understands `method(address,uint256)` with literal arguments.
#[derive(Debug, Default)]
pub struct StubAbi;

impl AbiPort for StubAbi {
    fn encode_calldata(
        &self,
        _abi_json: &str,
        method: &str,
        args: &[String],
    ) -> Result<Bytes, PortError> {
        let selector = keccak256(method.as_bytes());
        let mut out = selector[..4].to_vec();
        for arg in args {
            let word = if let Ok(address) = arg.parse::<Address>() {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(address.as_slice());
                word
            } else {
                let value: U256 = arg
                    .parse()
                    .map_err(|_| PortError::Validation(format!("unsupported arg {arg}")))?;
                value.to_be_bytes::<32>()
            };
            out.extend_from_slice(&word);
        }
        Ok(out.into())
    }
}

#[derive(Debug)]
pub struct TestClock {
    now: AtomicU64,
}

impl Default for TestClock {
    fn default() -> Self {
        Self {
            now: AtomicU64::new(1_739_750_400_000),
        }
    }
}

impl TestClock {
    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockPort for TestClock {
    fn now_ms(&self) -> Result<u64, PortError> {
        Ok(self.now.load(Ordering::SeqCst))
    }
}

pub type TestOrchestrator = Orchestrator<
    MockSigner,
    MockChain,
    MemoryKv,
    MockResponder,
    StubAbi,
    MockRegistry,
    TestClock,
>;

/// Orchestrator over `state` with owner `signer_idx` connected.
pub fn new_orchestrator(state: SharedChain, signer_idx: usize) -> TestOrchestrator {
    new_orchestrator_with(state, signer_idx, MockRegistry::default())
}

pub fn new_orchestrator_with(
    state: SharedChain,
    signer_idx: usize,
    registry: MockRegistry,
) -> TestOrchestrator {
    Orchestrator::new(
        MockSigner::new(signer_idx, state.clone()),
        MockChain::new(state),
        MemoryKv::default(),
        MockResponder::default(),
        StubAbi,
        registry,
        TestClock::default(),
        OrchestratorConfig {
            receipt_timeout: Duration::from_secs(1),
            ..OrchestratorConfig::default()
        },
    )
}
