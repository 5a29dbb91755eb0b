pub mod deploy;
pub mod hash;
pub mod message;
pub mod multisend;
pub mod owners;
pub mod predict;
pub mod queue;
pub mod state;
pub mod tx;

use std::path::PathBuf;

use alloy::primitives::Address;
use clap::Args;
use eyre::Result;

use rusty_safe_multisig_adapters::{build_orchestrator, LiveOrchestrator, MultisigConfig};
use rusty_safe_multisig_core::{
    CommandResult, QueueKey, RequestOutcome, SafeHashes, SigningCommand,
};

/// Overrides on top of the `RUSTY_SAFE_*` environment.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// JSON-RPC endpoint
    #[arg(long, env = "RUSTY_SAFE_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Chain id of the account
    #[arg(long, env = "RUSTY_SAFE_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// JSON file holding the queue and account registry
    #[arg(long, env = "RUSTY_SAFE_STORE_PATH")]
    pub store: Option<PathBuf>,
}

impl ConnectionArgs {
    pub fn config(&self) -> Result<MultisigConfig> {
        let mut config = MultisigConfig::from_env()?;
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(path) = &self.store {
            config.store_path = Some(path.clone());
        }
        if config.store_path.is_none() {
            tracing::warn!("no store configured; queue changes are lost on exit");
        }
        Ok(config)
    }
}

/// One account on one chain, reached through the configured ports.
#[derive(Args, Debug, Clone)]
pub struct AccountArgs {
    /// Account address
    #[arg(long)]
    pub safe: Address,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl AccountArgs {
    pub fn connect(&self) -> Result<(LiveOrchestrator, QueueKey)> {
        let config = self.connection.config()?;
        let key = QueueKey::new(self.safe, config.chain_id);
        Ok((build_orchestrator(&config)?, key))
    }

    /// Connects and runs the command built for this account's queue.
    pub async fn dispatch<F>(&self, build: F) -> Result<CommandResult>
    where
        F: FnOnce(QueueKey) -> SigningCommand,
    {
        let (orchestrator, key) = self.connect()?;
        Ok(orchestrator.handle(build(key)).await?)
    }
}

pub fn print_hashes(hashes: &SafeHashes) {
    println!("Domain hash:  {}", hashes.domain_hash);
    println!("Message hash: {}", hashes.struct_hash);
    println!("Safe hash:    {}", hashes.digest);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_result(result: &CommandResult) -> Result<()> {
    if let Some(hash) = result.safe_tx_hash {
        println!("safeTxHash:      {hash}");
    }
    if let Some(hash) = result.message_hash {
        println!("messageHash:     {hash}");
    }
    if let Some(nonce) = result.nonce {
        println!("nonce:           {nonce}");
    }
    if let Some(met) = result.threshold_met {
        println!("threshold met:   {met}");
    }
    if let Some(merge) = result.merge {
        println!(
            "merged:          {} added, {} merged, {} replaced, {} skipped, {} signatures rejected",
            merge.added, merge.merged, merge.replaced, merge.skipped, merge.rejected_signatures
        );
    }
    if let Some(removed) = result.removed {
        println!("removed:         {removed}");
    }
    if let Some(outcome) = &result.request {
        match outcome {
            RequestOutcome::Pending => println!("request:         pending"),
            RequestOutcome::Approved => println!("request:         approved"),
            RequestOutcome::Rejected { code, message } => {
                println!("request:         rejected ({code}: {message})")
            }
        }
    }
    if let Some(execution) = &result.deployment {
        println!("Deployment:");
        for step in execution.steps() {
            print!("  {:<16} {:?}", step.name, step.status);
            if let Some(err) = &step.error {
                print!(" ({err})");
            }
            println!();
        }
    }
    if let Some(hash) = result.executed_tx_hash {
        println!("transaction:     {hash}");
    }
    for warning in &result.warnings {
        println!("warning:         {}", warning.message());
    }
    if let Some(exported) = &result.exported {
        print_json(exported)?;
    }
    Ok(())
}
