use alloy::primitives::Address;

use rusty_safe_multisig_core::{AccountRegistry, KeyValueStore, PortError, UndeployedSafe};

/// Undeployed-account records and the deployed set, kept in a key-value store.
#[derive(Debug)]
pub struct KvAccountRegistry<S> {
    store: S,
}

impl<S: KeyValueStore> KvAccountRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn undeployed_key(chain_id: u64, address: Address) -> String {
        format!("accounts/undeployed/{chain_id}/{address:#x}")
    }

    fn deployed_key(chain_id: u64) -> String {
        format!("accounts/deployed/{chain_id}")
    }

    pub fn deployed(&self, chain_id: u64) -> Result<Vec<Address>, PortError> {
        let Some(raw) = self.store.get(&Self::deployed_key(chain_id))? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| {
            PortError::Validation(format!("deployed list for chain {chain_id} is corrupt: {e}"))
        })
    }
}

impl<S: KeyValueStore> AccountRegistry for KvAccountRegistry<S> {
    fn load_undeployed(
        &self,
        chain_id: u64,
        address: Address,
    ) -> Result<Option<UndeployedSafe>, PortError> {
        let Some(raw) = self.store.get(&Self::undeployed_key(chain_id, address))? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PortError::Validation(format!("undeployed record {address} is corrupt: {e}")))
    }

    fn save_undeployed(&self, safe: &UndeployedSafe) -> Result<(), PortError> {
        let raw = serde_json::to_string(safe)
            .map_err(|e| PortError::Validation(format!("serialize undeployed record: {e}")))?;
        self.store
            .set(&Self::undeployed_key(safe.chain_id, safe.address), &raw)
    }

    fn remove_undeployed(&self, chain_id: u64, address: Address) -> Result<(), PortError> {
        self.store.delete(&Self::undeployed_key(chain_id, address))
    }

    fn mark_deployed(&self, chain_id: u64, address: Address) -> Result<(), PortError> {
        let mut deployed = self.deployed(chain_id)?;
        if !deployed.contains(&address) {
            deployed.push(address);
            let raw = serde_json::to_string(&deployed)
                .map_err(|e| PortError::Validation(format!("serialize deployed list: {e}")))?;
            self.store.set(&Self::deployed_key(chain_id), &raw)?;
        }
        self.remove_undeployed(chain_id, address)?;
        tracing::info!(%address, chain_id, "account marked deployed");
        Ok(())
    }
}
