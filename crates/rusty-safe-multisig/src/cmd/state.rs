use clap::Parser;
use eyre::Result;

use rusty_safe_multisig_core::ChainReader;

use super::{print_json, AccountArgs};

#[derive(Parser, Debug)]
pub struct StateArgs {
    #[command(flatten)]
    account: AccountArgs,
}

impl StateArgs {
    pub async fn run(self) -> Result<()> {
        let (orchestrator, key) = self.account.connect()?;
        let state = orchestrator.account(&key).await?;
        let balance = orchestrator.chain.balance(key.account).await?;
        print_json(&state)?;
        println!("Balance (wei): {balance}");
        let queued = orchestrator.queue.transactions(&key)?;
        let messages = orchestrator.queue.messages(&key)?;
        println!("Queued: {} transaction(s), {} message(s)", queued.len(), messages.len());
        Ok(())
    }
}
