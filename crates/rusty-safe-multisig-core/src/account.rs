use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

use crate::contracts::ISafe;
use crate::domain::{AccountState, SafeVersion};
use crate::error::CoreError;
use crate::ports::{AccountRegistry, ChainReader};

/// Reads owners, threshold, nonce and version, from chain when the account has
/// code and from the local undeployed record otherwise.
pub struct AccountStateReader<'a, C: ?Sized, R: ?Sized> {
    chain: &'a C,
    registry: &'a R,
}

impl<'a, C, R> AccountStateReader<'a, C, R>
where
    C: ChainReader + ?Sized,
    R: AccountRegistry + ?Sized,
{
    pub fn new(chain: &'a C, registry: &'a R) -> Self {
        Self { chain, registry }
    }

    pub async fn read(&self, chain_id: u64, account: Address) -> Result<AccountState, CoreError> {
        let code = self.chain.code_at(account).await?;
        if code.is_empty() {
            let undeployed = self
                .registry
                .load_undeployed(chain_id, account)?
                .ok_or_else(|| {
                    CoreError::NotFound(format!(
                        "no code at {account} on chain {chain_id} and no undeployed record"
                    ))
                })?;
            tracing::debug!(%account, chain_id, "account not deployed, using local configuration");
            return Ok(undeployed.account_state());
        }

        let owners = self.call(account, ISafe::getOwnersCall {}).await?._0;
        let threshold = self.call(account, ISafe::getThresholdCall {}).await?._0;
        let nonce = self.call(account, ISafe::nonceCall {}).await?._0;
        let version = self.call(account, ISafe::VERSIONCall {}).await?._0;

        Ok(AccountState {
            address: account,
            chain_id,
            owners,
            threshold: to_u64(threshold, "threshold")?,
            nonce: to_u64(nonce, "nonce")?,
            version: SafeVersion::parse(&version)?,
            deployed: true,
        })
    }

    pub async fn balance(&self, address: Address) -> Result<U256, CoreError> {
        Ok(self.chain.balance(address).await?)
    }

    async fn call<T: SolCall>(&self, to: Address, call: T) -> Result<T::Return, CoreError> {
        let raw = self.chain.call(to, call.abi_encode().into()).await?;
        T::abi_decode_returns(&raw, true)
            .map_err(|e| CoreError::Chain(format!("decode {} result: {e}", T::SIGNATURE)))
    }
}

fn to_u64(value: U256, field: &str) -> Result<u64, CoreError> {
    u64::try_from(value).map_err(|_| CoreError::Chain(format!("{field} does not fit in u64: {value}")))
}
