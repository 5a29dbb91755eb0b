use alloy::primitives::Bytes;
use clap::Parser;
use eyre::Result;

use rusty_safe_multisig_core::{decode_multisend, decode_multisend_calldata};

#[derive(Parser, Debug)]
pub struct MultisendArgs {
    /// `multiSend(bytes)` calldata, or the packed blob with --packed
    #[arg(long)]
    data: Bytes,

    /// Treat --data as the packed transactions blob
    #[arg(long)]
    packed: bool,
}

impl MultisendArgs {
    pub fn run(self) -> Result<()> {
        let calls = if self.packed {
            decode_multisend(&self.data)?
        } else {
            decode_multisend_calldata(&self.data)?
        };
        println!("{} call(s)", calls.len());
        for (i, call) in calls.iter().enumerate() {
            println!("#{i}");
            println!("  operation: {:?}", call.operation);
            println!("  to:        {}", call.to);
            println!("  value:     {}", call.value);
            println!("  data:      {}", call.data);
        }
        Ok(())
    }
}
