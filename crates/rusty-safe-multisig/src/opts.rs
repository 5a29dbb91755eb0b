use crate::cmd::{
    deploy::DeployArgs,
    hash::{MessageHashArgs, TxHashArgs},
    message::MessageArgs,
    multisend::MultisendArgs,
    owners::OwnersArgs,
    predict::PredictArgs,
    queue::QueueArgs,
    state::StateArgs,
    tx::TxArgs,
};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rusty-safe-multisig")]
#[command(version, about = "Coordinate Safe multisig signing without a backend", long_about = None)]
pub struct MultisigCli {
    #[command(subcommand)]
    pub cmd: MultisigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum MultisigSubcommand {
    /// Compute the EIP-712 hashes of a SafeTx
    TxHash(TxHashArgs),

    /// Compute the EIP-712 hashes of a SafeMessage
    MessageHash(MessageHashArgs),

    /// Plan owner and threshold changes as one transaction
    Owners(OwnersArgs),

    /// Decode a MultiSend payload into its calls
    Multisend(MultisendArgs),

    /// Predict the address of a new account, optionally registering it
    Predict(PredictArgs),

    /// Read owners, threshold, nonce and version of an account
    State(StateArgs),

    /// Queue, sign and execute transactions
    Tx(TxArgs),

    /// Queue and sign off-chain messages
    Message(MessageArgs),

    /// List, export and import the pending queue
    Queue(QueueArgs),

    /// Deploy a registered account
    Deploy(DeployArgs),
}
