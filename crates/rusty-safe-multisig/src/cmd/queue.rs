use std::path::Path;

use alloy::primitives::B256;
use clap::{Args, Parser, Subcommand};
use eyre::Result;

use rusty_safe_multisig_adapters::share::{message_link, transactions_link};
use rusty_safe_multisig_adapters::parse_link;
use rusty_safe_multisig_core::{MessageBundle, SigningCommand, TransactionBundle};

use super::{print_result, AccountArgs};

#[derive(Parser, Debug)]
pub struct QueueArgs {
    #[command(subcommand)]
    cmd: QueueCommand,
}

#[derive(Subcommand, Debug)]
enum QueueCommand {
    /// Show queued transactions and messages
    List(ListArgs),

    /// Export transactions as JSON or a share link
    Export(ExportArgs),

    /// Export one message as JSON or a share link
    ExportMessage(ExportMessageArgs),

    /// Import a JSON bundle, a bundle file, or a share link
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    #[command(flatten)]
    account: AccountArgs,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Nonce to export (repeatable); everything when omitted
    #[arg(long)]
    nonce: Vec<u64>,

    /// Print a share link on this base URL instead of JSON
    #[arg(long)]
    link: Option<String>,
}

#[derive(Args, Debug)]
struct ExportMessageArgs {
    #[command(flatten)]
    account: AccountArgs,

    #[arg(long)]
    hash: B256,

    #[arg(long)]
    link: Option<String>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Bundle JSON, a file holding it, or a link carrying importTx / importMsg / importSig
    input: String,
}

impl QueueArgs {
    pub async fn run(self) -> Result<()> {
        match self.cmd {
            QueueCommand::List(args) => list(&args.account),
            QueueCommand::Export(args) => {
                let nonces = (!args.nonce.is_empty()).then_some(args.nonce);
                let result = args
                    .account
                    .dispatch(|key| SigningCommand::ExportTransactions { key, nonces })
                    .await?;
                match (&args.link, &result.exported) {
                    (Some(base), Some(exported)) => {
                        let bundle: TransactionBundle = serde_json::from_value(exported.clone())?;
                        println!("{}", transactions_link(base, &bundle)?);
                        Ok(())
                    }
                    _ => print_result(&result),
                }
            }
            QueueCommand::ExportMessage(args) => {
                let result = args
                    .account
                    .dispatch(|key| SigningCommand::ExportMessage {
                        key,
                        message_hash: args.hash,
                    })
                    .await?;
                match (&args.link, &result.exported) {
                    (Some(base), Some(exported)) => {
                        let bundle: MessageBundle = serde_json::from_value(exported.clone())?;
                        println!("{}", message_link(base, &bundle)?);
                        Ok(())
                    }
                    _ => print_result(&result),
                }
            }
            QueueCommand::Import(args) => {
                let input = read_input(&args.input)?;
                let result = if looks_like_json(&input) {
                    let is_message = serde_json::from_str::<serde_json::Value>(&input)
                        .map(|v| v.get("message").is_some())
                        .unwrap_or(false);
                    args.account
                        .dispatch(|key| {
                            if is_message {
                                SigningCommand::ImportMessage { key, blob: input }
                            } else {
                                SigningCommand::ImportTransactions { key, blob: input }
                            }
                        })
                        .await?
                } else {
                    let payload = parse_link(&input)?;
                    tracing::info!(kind = payload.key(), "importing share link");
                    args.account
                        .dispatch(|key| payload.into_command(key))
                        .await?
                };
                print_result(&result)
            }
        }
    }
}

fn list(account: &AccountArgs) -> Result<()> {
    let (orchestrator, key) = account.connect()?;
    let transactions = orchestrator.queue.transactions(&key)?;
    let messages = orchestrator.queue.messages(&key)?;

    println!("Queue {key}");
    println!();
    println!("Transactions: {}", transactions.len());
    for tx in &transactions {
        println!(
            "  nonce {:<6} to {} value {} data {} bytes, {} signature(s)",
            tx.data.nonce,
            tx.data.to,
            tx.data.value,
            tx.data.data.len(),
            tx.signatures.len()
        );
    }
    println!("Messages: {}", messages.len());
    for msg in &messages {
        println!(
            "  {} {} signature(s)",
            msg.message_hash,
            msg.signatures.len()
        );
    }
    Ok(())
}

/// `input` itself, or the contents of the file it names.
fn read_input(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if !looks_like_json(trimmed) && Path::new(trimmed).is_file() {
        return Ok(std::fs::read_to_string(trimmed)?.trim().to_owned());
    }
    Ok(trimmed.to_owned())
}

fn looks_like_json(input: &str) -> bool {
    input.starts_with('{') || input.starts_with('[')
}
