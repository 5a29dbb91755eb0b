use std::path::PathBuf;

use alloy::primitives::B256;
use clap::{ArgGroup, Args, Parser, Subcommand};
use eyre::Result;

use rusty_safe_multisig_core::{Signature, SigningCommand};

use super::hash::message_payload;
use super::{print_result, AccountArgs};

#[derive(Parser, Debug)]
pub struct MessageArgs {
    #[command(subcommand)]
    cmd: MessageCommand,
}

#[derive(Subcommand, Debug)]
enum MessageCommand {
    /// Queue a message for signing
    Create(CreateArgs),

    /// Sign a queued message with the configured signer
    Sign(HashArgs),

    /// Add a signature collected elsewhere
    AddSignature(AddSignatureArgs),

    /// Delete one queued message, or all of them
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("payload").required(true).args(["message", "typed_data"])))]
struct CreateArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Plain text, or 0x-prefixed UTF-8
    #[arg(long)]
    message: Option<String>,

    /// File holding EIP-712 typed data
    #[arg(long)]
    typed_data: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct HashArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// SafeMessage hash
    #[arg(long)]
    hash: B256,
}

#[derive(Args, Debug)]
struct AddSignatureArgs {
    #[command(flatten)]
    account: AccountArgs,

    #[arg(long)]
    hash: B256,

    #[arg(long)]
    signer: String,

    #[arg(long)]
    signature: String,

    #[arg(long)]
    contract: bool,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    account: AccountArgs,

    #[arg(long)]
    hash: Option<B256>,
}

impl MessageArgs {
    pub async fn run(self) -> Result<()> {
        let result = match self.cmd {
            MessageCommand::Create(args) => {
                let payload = message_payload(args.message.as_deref(), args.typed_data.as_ref())?;
                args.account
                    .dispatch(|key| SigningCommand::CreateMessage { key, payload })
                    .await?
            }
            MessageCommand::Sign(args) => {
                args.account
                    .dispatch(|key| SigningCommand::SignMessage {
                        key,
                        message_hash: args.hash,
                    })
                    .await?
            }
            MessageCommand::AddSignature(args) => {
                let signature =
                    Signature::from_parts(&args.signer, &args.signature, args.contract)?;
                args.account
                    .dispatch(|key| SigningCommand::AddMessageSignature {
                        key,
                        message_hash: args.hash,
                        signature,
                    })
                    .await?
            }
            MessageCommand::Delete(args) => {
                args.account
                    .dispatch(|key| SigningCommand::DeleteMessage {
                        key,
                        message_hash: args.hash,
                    })
                    .await?
            }
        };
        print_result(&result)
    }
}
