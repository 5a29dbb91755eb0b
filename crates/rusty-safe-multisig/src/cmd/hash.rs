use std::path::PathBuf;

use alloy::primitives::{Address, Bytes, U256};
use clap::{ArgGroup, Parser};
use eyre::Result;

use rusty_safe_multisig_core::{
    safe_message_hashes, safe_tx_hashes, DigestContext, Operation, SafeMessagePayload,
    SafeTransaction, SafeVersion,
};

use super::print_hashes;

#[derive(Parser, Debug)]
pub struct TxHashArgs {
    /// Account address
    #[arg(long)]
    safe: Address,

    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Account version; below 1.3.0 the domain has no chain id
    #[arg(long, default_value = "1.4.1")]
    safe_version: String,

    #[arg(long)]
    to: Address,

    #[arg(long, default_value = "0")]
    value: U256,

    #[arg(long, default_value = "0x")]
    data: Bytes,

    /// 0 = call, 1 = delegatecall
    #[arg(long, default_value_t = 0)]
    operation: u8,

    #[arg(long, default_value = "0")]
    safe_tx_gas: U256,

    #[arg(long, default_value = "0")]
    base_gas: U256,

    #[arg(long, default_value = "0")]
    gas_price: U256,

    #[arg(long)]
    gas_token: Option<Address>,

    #[arg(long)]
    refund_receiver: Option<Address>,

    #[arg(long)]
    nonce: u64,
}

impl TxHashArgs {
    pub fn run(self) -> Result<()> {
        let ctx = DigestContext::new(
            self.chain_id,
            self.safe,
            SafeVersion::parse(&self.safe_version)?,
        );
        let tx = SafeTransaction {
            to: self.to,
            value: self.value,
            data: self.data,
            operation: Operation::from_u8(self.operation)?,
            safe_tx_gas: self.safe_tx_gas,
            base_gas: self.base_gas,
            gas_price: self.gas_price,
            gas_token: self.gas_token.unwrap_or_default(),
            refund_receiver: self.refund_receiver.unwrap_or_default(),
            nonce: self.nonce,
        };
        print_hashes(&safe_tx_hashes(&tx, &ctx));
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["message", "typed_data"])))]
pub struct MessageHashArgs {
    /// Account address
    #[arg(long)]
    safe: Address,

    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    #[arg(long, default_value = "1.4.1")]
    safe_version: String,

    /// Plain text, or 0x-prefixed UTF-8 as sent by `personal_sign`
    #[arg(long)]
    message: Option<String>,

    /// File holding EIP-712 typed data
    #[arg(long)]
    typed_data: Option<PathBuf>,
}

impl MessageHashArgs {
    pub fn run(self) -> Result<()> {
        let ctx = DigestContext::new(
            self.chain_id,
            self.safe,
            SafeVersion::parse(&self.safe_version)?,
        );
        let payload = message_payload(self.message.as_deref(), self.typed_data.as_ref())?;
        print_hashes(&safe_message_hashes(&payload, &ctx)?);
        Ok(())
    }
}

pub fn message_payload(
    message: Option<&str>,
    typed_data: Option<&PathBuf>,
) -> Result<SafeMessagePayload> {
    match (message, typed_data) {
        (Some(text), _) => Ok(SafeMessagePayload::personal_sign(text)),
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            Ok(SafeMessagePayload::typed_data(&value)?)
        }
        (None, None) => eyre::bail!("either --message or --typed-data is required"),
    }
}
