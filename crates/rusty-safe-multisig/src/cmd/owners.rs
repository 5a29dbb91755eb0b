use alloy::primitives::Address;
use clap::Parser;
use eyre::Result;

use rusty_safe_multisig_core::{plan_owner_changes, ContractSet, OwnerChange, OwnerOperation};

use super::print_json;

/// Offline: works from the owner list as given, head of the linked list first.
#[derive(Parser, Debug)]
pub struct OwnersArgs {
    /// Account address
    #[arg(long)]
    safe: Address,

    /// Current owners in on-chain order
    #[arg(long, value_delimiter = ',', required = true)]
    owners: Vec<Address>,

    /// Current threshold
    #[arg(long)]
    threshold: u64,

    /// Owner to add (repeatable)
    #[arg(long)]
    add: Vec<Address>,

    /// Owner to remove (repeatable)
    #[arg(long)]
    remove: Vec<Address>,

    #[arg(long)]
    new_threshold: u64,

    /// MultiSend contract used when more than one call is needed
    #[arg(long)]
    multi_send: Option<Address>,
}

impl OwnersArgs {
    pub fn run(self) -> Result<()> {
        let changes: Vec<OwnerChange> = self
            .remove
            .iter()
            .copied()
            .map(OwnerChange::Remove)
            .chain(self.add.iter().copied().map(OwnerChange::Add))
            .collect();
        let plan = plan_owner_changes(&self.owners, self.threshold, &changes, self.new_threshold)?;

        println!("Operations:");
        for op in &plan.operations {
            println!("  {}", describe(op));
        }
        println!("Final owners:");
        for owner in &plan.final_owners {
            println!("  {owner}");
        }
        println!("Final threshold: {}", plan.final_threshold);
        println!();

        let multi_send = self
            .multi_send
            .unwrap_or(ContractSet::default().multi_send);
        print_json(&plan.to_transaction(self.safe, multi_send)?)
    }
}

fn describe(op: &OwnerOperation) -> String {
    match *op {
        OwnerOperation::AddOwnerWithThreshold { owner, threshold } => {
            format!("addOwnerWithThreshold({owner}, {threshold})")
        }
        OwnerOperation::RemoveOwner {
            prev_owner,
            owner,
            threshold,
        } => format!("removeOwner({prev_owner}, {owner}, {threshold})"),
        OwnerOperation::SwapOwner {
            prev_owner,
            old_owner,
            new_owner,
        } => format!("swapOwner({prev_owner}, {old_owner}, {new_owner})"),
        OwnerOperation::ChangeThreshold { threshold } => format!("changeThreshold({threshold})"),
    }
}
