use clap::Parser;
use eyre::Result;

use rusty_safe_multisig_core::SigningCommand;

use super::{print_result, AccountArgs};

/// Runs the deployment of an account recorded with `predict --save`.
#[derive(Parser, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    account: AccountArgs,
}

impl DeployArgs {
    pub async fn run(self) -> Result<()> {
        let (orchestrator, key) = self.account.connect()?;
        let result = orchestrator.handle(SigningCommand::DeployAccount { key }).await?;
        print_result(&result)?;
        match &result.deployment {
            Some(execution) if !execution.is_success() => eyre::bail!("deployment failed"),
            _ => Ok(()),
        }
    }
}
