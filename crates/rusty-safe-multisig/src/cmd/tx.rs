use std::path::PathBuf;

use alloy::primitives::{Address, Bytes, U256};
use clap::{Args, Parser, Subcommand};
use eyre::Result;

use rusty_safe_multisig_core::{
    CommandResult, Operation, OwnerChange, SafeTransaction, Signature, SigningCommand,
    TransactionDraft,
};

use super::{print_result, AccountArgs};

#[derive(Parser, Debug)]
pub struct TxArgs {
    #[command(subcommand)]
    cmd: TxCommand,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    /// Queue a transaction from raw fields
    Create(CreateArgs),

    /// Queue a native or ERC-20 transfer
    Transfer(TransferArgs),

    /// Queue a contract call encoded from a JSON ABI
    Call(CallArgs),

    /// Queue owner and threshold changes read against the current owners
    ChangeOwners(ChangeOwnersArgs),

    /// Sign a queued transaction with the configured signer
    Sign(NonceArgs),

    /// Add a signature collected elsewhere
    AddSignature(AddSignatureArgs),

    /// Execute a fully signed transaction
    Execute(NonceArgs),

    /// Delete one queued transaction, or all of them
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[command(flatten)]
    account: AccountArgs,

    #[arg(long)]
    to: Address,

    #[arg(long, default_value = "0")]
    value: U256,

    #[arg(long, default_value = "0x")]
    data: Bytes,

    /// 0 = call, 1 = delegatecall
    #[arg(long, default_value_t = 0)]
    operation: u8,

    /// Defaults to the next free nonce
    #[arg(long)]
    nonce: Option<u64>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Recipient
    #[arg(long)]
    to: Address,

    /// Amount in the token's base unit
    #[arg(long)]
    amount: U256,

    /// ERC-20 token; native coin when omitted
    #[arg(long)]
    token: Option<Address>,

    #[arg(long)]
    nonce: Option<u64>,
}

#[derive(Args, Debug)]
struct CallArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Contract to call
    #[arg(long)]
    to: Address,

    #[arg(long, default_value = "0")]
    value: U256,

    /// JSON ABI file
    #[arg(long)]
    abi: PathBuf,

    /// Method name, or full signature to pick an overload
    #[arg(long)]
    method: String,

    /// Method argument (repeatable, in order)
    #[arg(long = "arg")]
    args: Vec<String>,

    #[arg(long)]
    nonce: Option<u64>,
}

#[derive(Args, Debug)]
struct ChangeOwnersArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Owner to add (repeatable)
    #[arg(long)]
    add: Vec<Address>,

    /// Owner to remove (repeatable)
    #[arg(long)]
    remove: Vec<Address>,

    #[arg(long)]
    threshold: u64,

    #[arg(long)]
    nonce: Option<u64>,
}

#[derive(Args, Debug)]
struct NonceArgs {
    #[command(flatten)]
    account: AccountArgs,

    #[arg(long)]
    nonce: u64,
}

#[derive(Args, Debug)]
struct AddSignatureArgs {
    #[command(flatten)]
    account: AccountArgs,

    #[arg(long)]
    nonce: u64,

    /// Owner that produced the signature
    #[arg(long)]
    signer: String,

    /// Signature bytes, 0x-prefixed
    #[arg(long)]
    signature: String,

    /// EIP-1271 signature of an owner contract
    #[arg(long)]
    contract: bool,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    #[command(flatten)]
    account: AccountArgs,

    /// Nonce to delete; every queued transaction when omitted
    #[arg(long)]
    nonce: Option<u64>,
}

impl TxArgs {
    pub async fn run(self) -> Result<()> {
        let result = match self.cmd {
            TxCommand::Create(args) => {
                let transaction = SafeTransaction::new(
                    args.to,
                    args.value,
                    args.data,
                    Operation::from_u8(args.operation)?,
                );
                create(&args.account, TransactionDraft::Raw { transaction }, args.nonce).await?
            }
            TxCommand::Transfer(args) => {
                let draft = match args.token {
                    Some(token) => TransactionDraft::Erc20Transfer {
                        token,
                        to: args.to,
                        amount: args.amount,
                    },
                    None => TransactionDraft::NativeTransfer {
                        to: args.to,
                        amount: args.amount,
                    },
                };
                create(&args.account, draft, args.nonce).await?
            }
            TxCommand::Call(args) => {
                let draft = TransactionDraft::ContractCall {
                    to: args.to,
                    value: args.value,
                    abi_json: std::fs::read_to_string(&args.abi)?,
                    method: args.method,
                    args: args.args,
                };
                create(&args.account, draft, args.nonce).await?
            }
            TxCommand::ChangeOwners(args) => {
                let changes = args
                    .remove
                    .iter()
                    .copied()
                    .map(OwnerChange::Remove)
                    .chain(args.add.iter().copied().map(OwnerChange::Add))
                    .collect();
                let draft = TransactionDraft::OwnerChanges {
                    changes,
                    new_threshold: args.threshold,
                };
                create(&args.account, draft, args.nonce).await?
            }
            TxCommand::Sign(args) => {
                args.account
                    .dispatch(|key| SigningCommand::SignTransaction {
                        key,
                        nonce: args.nonce,
                    })
                    .await?
            }
            TxCommand::AddSignature(args) => {
                let signature =
                    Signature::from_parts(&args.signer, &args.signature, args.contract)?;
                args.account
                    .dispatch(|key| SigningCommand::AddTransactionSignature {
                        key,
                        nonce: args.nonce,
                        signature,
                    })
                    .await?
            }
            TxCommand::Execute(args) => {
                args.account
                    .dispatch(|key| SigningCommand::ExecuteTransaction {
                        key,
                        nonce: args.nonce,
                    })
                    .await?
            }
            TxCommand::Delete(args) => {
                args.account
                    .dispatch(|key| SigningCommand::DeleteTransaction {
                        key,
                        nonce: args.nonce,
                    })
                    .await?
            }
        };
        print_result(&result)
    }
}

async fn create(
    account: &AccountArgs,
    draft: TransactionDraft,
    nonce: Option<u64>,
) -> Result<CommandResult> {
    account
        .dispatch(|key| SigningCommand::CreateTransaction { key, draft, nonce })
        .await
}
