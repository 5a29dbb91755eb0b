use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;

use rusty_safe_multisig_adapters::{ConfigError, MultisigConfig};
use rusty_safe_multisig_core::ContractSet;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn defaults_apply_without_variables() {
    let cfg = MultisigConfig::from_lookup(lookup(&[])).expect("config");
    assert_eq!(cfg.rpc_url, "http://127.0.0.1:8545");
    assert_eq!(cfg.chain_id, 1);
    assert!(cfg.store_path.is_none());
    assert!(cfg.eip1193_proxy_url.is_none());
    assert_eq!(cfg.contracts, ContractSet::default());
    assert_eq!(cfg.orchestrator_config().request_ttl_ms, 300_000);
}

#[test]
fn variables_override_defaults() {
    let cfg = MultisigConfig::from_lookup(lookup(&[
        ("RUSTY_SAFE_RPC_URL", " https://rpc.example "),
        ("RUSTY_SAFE_CHAIN_ID", "8453"),
        ("RUSTY_SAFE_STORE_PATH", "/tmp/queue.json"),
        ("RUSTY_SAFE_EIP1193_PROXY_URL", "http://127.0.0.1:1248"),
        ("RUSTY_SAFE_REQUEST_TIMEOUT_MS", "2500"),
        ("RUSTY_SAFE_RECEIPT_TIMEOUT_MS", "9000"),
        ("RUSTY_SAFE_RECEIPT_POLL_INTERVAL_MS", "250"),
        ("RUSTY_SAFE_REQUEST_TTL_MS", "60000"),
        (
            "RUSTY_SAFE_MULTI_SEND",
            "0x1111111111111111111111111111111111111111",
        ),
    ]))
    .expect("config");

    assert_eq!(cfg.rpc_url, "https://rpc.example");
    assert_eq!(cfg.chain_id, 8453);
    assert_eq!(cfg.store_path, Some(PathBuf::from("/tmp/queue.json")));
    assert_eq!(cfg.eip1193_proxy_url.as_deref(), Some("http://127.0.0.1:1248"));
    assert_eq!(cfg.request_timeout(), Duration::from_millis(2500));
    assert_eq!(cfg.receipt_poll_interval(), Duration::from_millis(250));
    assert_eq!(cfg.contracts.multi_send, Address::repeat_byte(0x11));
    assert_eq!(
        cfg.contracts.proxy_factory,
        ContractSet::default().proxy_factory
    );

    let orchestrator = cfg.orchestrator_config();
    assert_eq!(orchestrator.request_ttl_ms, 60_000);
    assert_eq!(orchestrator.receipt_timeout, Duration::from_millis(9000));
}

#[test]
fn blank_variables_count_as_unset() {
    let cfg = MultisigConfig::from_lookup(lookup(&[
        ("RUSTY_SAFE_SIGNER_PRIVATE_KEY", "   "),
        ("RUSTY_SAFE_CHAIN_ID", ""),
    ]))
    .expect("config");
    assert!(cfg.signer_private_key.is_none());
    assert_eq!(cfg.chain_id, 1);
}

#[test]
fn invalid_number_names_the_variable() {
    let err = MultisigConfig::from_lookup(lookup(&[("RUSTY_SAFE_CHAIN_ID", "mainnet")]))
        .expect_err("must fail");
    assert!(matches!(err, ConfigError::Invalid { .. }));
    let msg = err.to_string();
    assert!(msg.contains("RUSTY_SAFE_CHAIN_ID"));
    assert!(msg.contains("mainnet"));
}

#[test]
fn invalid_contract_address_is_rejected() {
    let err = MultisigConfig::from_lookup(lookup(&[("RUSTY_SAFE_SINGLETON", "0x1234")]))
        .expect_err("must fail");
    assert!(err.to_string().contains("address"));
}
