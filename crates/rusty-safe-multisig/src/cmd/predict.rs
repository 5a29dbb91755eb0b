use alloy::primitives::{Address, Bytes, U256};
use clap::Parser;
use eyre::Result;

use rusty_safe_multisig_adapters::{chain_reader, open_store, KvAccountRegistry};
use rusty_safe_multisig_core::{
    encode_setup, init_code_hash, predict_address, predict_undeployed, AccountRegistry,
    SafeAccountConfig, SafeDeploymentConfig, SafeVersion, UndeployedSafe,
};

use super::{print_json, ConnectionArgs};

#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// Initial owners
    #[arg(long, value_delimiter = ',', required = true)]
    owners: Vec<Address>,

    #[arg(long)]
    threshold: u64,

    #[arg(long, default_value = "0")]
    salt_nonce: U256,

    /// Defaults to the configured fallback handler
    #[arg(long)]
    fallback_handler: Option<Address>,

    #[arg(long, default_value = "1.4.1")]
    safe_version: String,

    /// Factory `proxyCreationCode()`; read over RPC when omitted
    #[arg(long)]
    creation_code: Option<Bytes>,

    /// Record the account so `deploy` can pick it up
    #[arg(long)]
    save: bool,

    #[command(flatten)]
    connection: ConnectionArgs,
}

impl PredictArgs {
    pub async fn run(self) -> Result<()> {
        let config = self.connection.config()?;
        let contracts = config.contracts;
        let mut safe = UndeployedSafe {
            chain_id: config.chain_id,
            address: Address::ZERO,
            safe_account_config: SafeAccountConfig {
                owners: self.owners,
                threshold: self.threshold,
                fallback_handler: self.fallback_handler,
            },
            safe_deployment_config: SafeDeploymentConfig {
                salt_nonce: self.salt_nonce,
                safe_version: SafeVersion::parse(&self.safe_version)?,
            },
        };

        safe.address = match &self.creation_code {
            Some(code) => predict_address(
                contracts.proxy_factory,
                init_code_hash(code, contracts.singleton),
                &encode_setup(&safe.safe_account_config, contracts.fallback_handler),
                safe.safe_deployment_config.salt_nonce,
            ),
            None => {
                let chain = chain_reader(&config)?;
                predict_undeployed(&chain, &contracts, &safe).await?.0
            }
        };

        println!("Predicted address: {}", safe.address);
        if self.save {
            let registry = KvAccountRegistry::new(open_store(&config)?);
            registry.save_undeployed(&safe)?;
            tracing::info!(address = %safe.address, chain_id = safe.chain_id, "account registered");
        }
        print_json(&safe)
    }
}
