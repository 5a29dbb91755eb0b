pub mod abi;
pub mod clock;
pub mod config;
pub mod eip1193;
pub mod registry;
pub mod rpc;
pub mod share;
pub mod storage;
pub mod wc;

use std::sync::Arc;

use rusty_safe_multisig_core::{KeyValueStore, Orchestrator, PortError};

pub use abi::AbiEncoder;
pub use clock::SystemClock;
pub use config::{ConfigError, MultisigConfig};
pub use eip1193::Eip1193Signer;
pub use registry::KvAccountRegistry;
pub use rpc::{JsonRpcChainReader, JsonRpcClient};
pub use share::{parse_link, SharePayload};
pub use storage::{JsonFileStore, MemoryStore};
pub use wc::{OutgoingResponse, Session, SessionStatus, WalletConnectAdapter};

pub type SharedStore = Arc<dyn KeyValueStore>;

pub type LiveOrchestrator = Orchestrator<
    Eip1193Signer,
    JsonRpcChainReader,
    SharedStore,
    WalletConnectAdapter,
    AbiEncoder,
    KvAccountRegistry<SharedStore>,
    SystemClock,
>;

/// File-backed when `store_path` is set, in-memory otherwise.
pub fn open_store(config: &MultisigConfig) -> Result<SharedStore, PortError> {
    Ok(match &config.store_path {
        Some(path) => Arc::new(JsonFileStore::open(path)?),
        None => Arc::new(MemoryStore::default()),
    })
}

pub fn chain_reader(config: &MultisigConfig) -> Result<JsonRpcChainReader, PortError> {
    let rpc = JsonRpcClient::new(config.rpc_url.clone(), config.request_timeout())?;
    Ok(JsonRpcChainReader::new(rpc, config.receipt_poll_interval()))
}

/// Wires every port from `config`; queue and registry share one store.
pub fn build_orchestrator(config: &MultisigConfig) -> Result<LiveOrchestrator, PortError> {
    let store = open_store(config)?;
    Ok(Orchestrator::new(
        Eip1193Signer::from_config(config)?,
        chain_reader(config)?,
        store.clone(),
        WalletConnectAdapter::default(),
        AbiEncoder,
        KvAccountRegistry::new(store),
        SystemClock,
        config.orchestrator_config(),
    ))
}
