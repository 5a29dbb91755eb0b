//! Multisig coordination from the command line: digests, owner plans, queue sharing and deployment.

use clap::Parser;
use opts::{MultisigCli, MultisigSubcommand};

mod cmd;
mod opts;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = MultisigCli::parse();

    match args.cmd {
        MultisigSubcommand::TxHash(cmd) => cmd.run(),
        MultisigSubcommand::MessageHash(cmd) => cmd.run(),
        MultisigSubcommand::Owners(cmd) => cmd.run(),
        MultisigSubcommand::Multisend(cmd) => cmd.run(),
        MultisigSubcommand::Predict(cmd) => cmd.run().await,
        MultisigSubcommand::State(cmd) => cmd.run().await,
        MultisigSubcommand::Tx(cmd) => cmd.run().await,
        MultisigSubcommand::Message(cmd) => cmd.run().await,
        MultisigSubcommand::Queue(cmd) => cmd.run().await,
        MultisigSubcommand::Deploy(cmd) => cmd.run().await,
    }
}
