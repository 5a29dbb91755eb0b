use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;

use rusty_safe_multisig_core::{ContractSet, OrchestratorConfig};

const ENV_PREFIX: &str = "RUSTY_SAFE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid {expected}: {value}")]
    Invalid {
        name: String,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct MultisigConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// JSON file backing the queue and account registry; in-memory when unset.
    pub store_path: Option<PathBuf>,
    /// Wallet reachable over JSON-RPC (`eth_accounts`, `eth_sign`, `eth_sendTransaction`).
    pub eip1193_proxy_url: Option<String>,
    /// Development-only local key. Ignored when a proxy URL is set.
    pub signer_private_key: Option<String>,
    pub request_timeout_ms: u64,
    pub receipt_timeout_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub request_ttl_ms: u64,
    pub contracts: ContractSet,
}

impl Default for MultisigConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_owned(),
            chain_id: 1,
            store_path: None,
            eip1193_proxy_url: None,
            signer_private_key: None,
            request_timeout_ms: 15_000,
            receipt_timeout_ms: 120_000,
            receipt_poll_interval_ms: 1_000,
            request_ttl_ms: 5 * 60 * 1000,
            contracts: ContractSet::default(),
        }
    }
}

impl MultisigConfig {
    /// Reads `RUSTY_SAFE_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`MultisigConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            let full = format!("{ENV_PREFIX}{name}");
            lookup(&full)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .map(|v| (full, v))
        };
        let mut cfg = Self::default();

        if let Some((_, v)) = var("RPC_URL") {
            cfg.rpc_url = v;
        }
        if let Some((name, v)) = var("CHAIN_ID") {
            cfg.chain_id = parse_u64(&name, &v)?;
        }
        cfg.store_path = var("STORE_PATH").map(|(_, v)| PathBuf::from(v));
        cfg.eip1193_proxy_url = var("EIP1193_PROXY_URL").map(|(_, v)| v);
        cfg.signer_private_key = var("SIGNER_PRIVATE_KEY").map(|(_, v)| v);
        if let Some((name, v)) = var("REQUEST_TIMEOUT_MS") {
            cfg.request_timeout_ms = parse_u64(&name, &v)?;
        }
        if let Some((name, v)) = var("RECEIPT_TIMEOUT_MS") {
            cfg.receipt_timeout_ms = parse_u64(&name, &v)?;
        }
        if let Some((name, v)) = var("RECEIPT_POLL_INTERVAL_MS") {
            cfg.receipt_poll_interval_ms = parse_u64(&name, &v)?;
        }
        if let Some((name, v)) = var("REQUEST_TTL_MS") {
            cfg.request_ttl_ms = parse_u64(&name, &v)?;
        }
        if let Some((name, v)) = var("MULTI_SEND") {
            cfg.contracts.multi_send = parse_address(&name, &v)?;
        }
        if let Some((name, v)) = var("PROXY_FACTORY") {
            cfg.contracts.proxy_factory = parse_address(&name, &v)?;
        }
        if let Some((name, v)) = var("SINGLETON") {
            cfg.contracts.singleton = parse_address(&name, &v)?;
        }
        if let Some((name, v)) = var("FALLBACK_HANDLER") {
            cfg.contracts.fallback_handler = parse_address(&name, &v)?;
        }
        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            contracts: self.contracts,
            request_ttl_ms: self.request_ttl_ms,
            receipt_timeout: Duration::from_millis(self.receipt_timeout_ms),
        }
    }
}

fn parse_u64(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name: name.to_owned(),
        expected: "unsigned integer",
        value: value.to_owned(),
    })
}

fn parse_address(name: &str, value: &str) -> Result<Address, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name: name.to_owned(),
        expected: "address",
        value: value.to_owned(),
    })
}
