use std::fmt;
use std::str::FromStr;

use alloy::primitives::{hex, Address, Bytes, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::CoreError;

/// Parses an address, enforcing the EIP-55 checksum whenever the input is mixed case.
pub fn parse_address(raw: &str) -> Result<Address, CoreError> {
    let raw = raw.trim();
    let body = raw.strip_prefix("0x").unwrap_or(raw);
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && has_lower {
        let prefixed = format!("0x{body}");
        return Address::parse_checksummed(&prefixed, None)
            .map_err(|e| CoreError::validation(format!("invalid address checksum '{raw}': {e}")));
    }
    Address::from_str(body).map_err(|e| CoreError::validation(format!("invalid address '{raw}': {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl Operation {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Call => 0,
            Self::DelegateCall => 1,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, CoreError> {
        match value {
            0 => Ok(Self::Call),
            1 => Ok(Self::DelegateCall),
            other => Err(CoreError::validation(format!("invalid operation: {other}"))),
        }
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        let value = match &raw {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .ok_or_else(|| serde::de::Error::custom(format!("invalid operation: {raw}")))?;
        let value = u8::try_from(value).map_err(serde::de::Error::custom)?;
        Self::from_u8(value).map_err(serde::de::Error::custom)
    }
}

/// The ten SafeTx fields. Numeric fields serialize as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransaction {
    #[serde(with = "codec::address")]
    pub to: Address,
    #[serde(with = "codec::decimal", default)]
    pub value: U256,
    #[serde(with = "codec::hex_bytes", default)]
    pub data: Bytes,
    #[serde(default)]
    pub operation: Operation,
    #[serde(with = "codec::decimal", default)]
    pub safe_tx_gas: U256,
    #[serde(with = "codec::decimal", default)]
    pub base_gas: U256,
    #[serde(with = "codec::decimal", default)]
    pub gas_price: U256,
    #[serde(with = "codec::address", default)]
    pub gas_token: Address,
    #[serde(with = "codec::address", default)]
    pub refund_receiver: Address,
    #[serde(with = "codec::nonce")]
    pub nonce: u64,
}

impl SafeTransaction {
    pub fn new(to: Address, value: U256, data: impl Into<Bytes>, operation: Operation) -> Self {
        Self {
            to,
            value,
            data: data.into(),
            operation,
            safe_tx_gas: U256::ZERO,
            base_gas: U256::ZERO,
            gas_price: U256::ZERO,
            gas_token: Address::ZERO,
            refund_receiver: Address::ZERO,
            nonce: 0,
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Builds a transaction from loosely typed string fields, as pasted or received from a dApp.
    /// Empty `value` / `data` normalize to `0` / `0x`.
    pub fn from_parts(
        to: &str,
        value: &str,
        data: &str,
        operation: u8,
        nonce: u64,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(
            parse_address(to)?,
            codec::parse_u256(value)?,
            codec::parse_bytes(data)?,
            Operation::from_u8(operation)?,
        )
        .with_nonce(nonce))
    }
}

/// Inner payload of an EIP-712 typed-data request, validated for shape only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct TypedDataPayload {
    pub domain: Value,
    pub types: Value,
    pub primary_type: String,
    pub message: Value,
}

impl TypedDataPayload {
    /// Accepts either an object or a JSON string holding one (`eth_signTypedData_v4`).
    pub fn from_value(value: &Value) -> Result<Self, CoreError> {
        let owned;
        let value = match value {
            Value::String(s) => {
                owned = serde_json::from_str::<Value>(s)
                    .map_err(|e| CoreError::validation(format!("typed data is not JSON: {e}")))?;
                &owned
            }
            other => other,
        };
        let obj = value
            .as_object()
            .ok_or_else(|| CoreError::validation("typed data must be an object"))?;
        for field in ["domain", "types", "primaryType", "message"] {
            if obj.get(field).map_or(true, Value::is_null) {
                return Err(CoreError::validation(format!("typed data missing '{field}'")));
            }
        }
        let primary_type = obj
            .get("primaryType")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::validation("typed data 'primaryType' must be a string"))?;
        Ok(Self {
            domain: obj["domain"].clone(),
            types: obj["types"].clone(),
            primary_type: primary_type.to_owned(),
            message: obj["message"].clone(),
        })
    }
}

impl TryFrom<Value> for TypedDataPayload {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

/// Off-chain message to be wrapped in a SafeMessage.
///
/// `Raw` is always hashed as EIP-191 over its literal text; hex decoding for
/// `personal_sign` happens once, in [`SafeMessagePayload::personal_sign`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SafeMessagePayload {
    Raw(String),
    TypedData(TypedDataPayload),
}

impl SafeMessagePayload {
    pub fn personal_sign(raw: &str) -> Self {
        Self::Raw(decode_utf8_hex(raw).unwrap_or_else(|| raw.to_owned()))
    }

    pub fn eth_sign(raw: &str) -> Self {
        Self::Raw(raw.to_owned())
    }

    pub fn typed_data(value: &Value) -> Result<Self, CoreError> {
        TypedDataPayload::from_value(value).map(Self::TypedData)
    }
}

fn decode_utf8_hex(raw: &str) -> Option<String> {
    let body = raw.strip_prefix("0x")?;
    let bytes = hex::decode(body).ok()?;
    String::from_utf8(bytes).ok()
}

/// Account version, compared numerically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeVersion {
    raw: String,
    version: semver::Version,
}

impl SafeVersion {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        // "1.3.0+L2" style suffixes carry no ordering information.
        let core = trimmed.split(['+', '-']).next().unwrap_or(trimmed);
        let version = semver::Version::parse(core)
            .map_err(|e| CoreError::validation(format!("invalid safe version '{raw}': {e}")))?;
        Ok(Self {
            raw: trimmed.to_owned(),
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Domains of 1.3.0+ accounts carry `chainId`.
    pub fn has_chain_id_domain(&self) -> bool {
        self.version >= semver::Version::new(1, 3, 0)
    }

    /// Pre-1.0.0 accounts name `baseGas` as `dataGas` in the SafeTx type.
    pub fn uses_data_gas(&self) -> bool {
        self.version < semver::Version::new(1, 0, 0)
    }
}

impl Default for SafeVersion {
    fn default() -> Self {
        Self {
            raw: "1.4.1".to_owned(),
            version: semver::Version::new(1, 4, 1),
        }
    }
}

impl fmt::Display for SafeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for SafeVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for SafeVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Composite pending-queue key. Queues on different chains never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueKey {
    pub account: Address,
    pub chain_id: u64,
}

impl QueueKey {
    pub fn new(account: Address, chain_id: u64) -> Self {
        Self { account, chain_id }
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_id, self.account)
    }
}

/// Read-only snapshot of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub address: Address,
    pub chain_id: u64,
    /// Linked-list order, head first.
    pub owners: Vec<Address>,
    pub threshold: u64,
    pub nonce: u64,
    pub version: SafeVersion,
    pub deployed: bool,
}

impl AccountState {
    pub fn key(&self) -> QueueKey {
        QueueKey::new(self.address, self.chain_id)
    }

    pub fn is_owner(&self, address: Address) -> bool {
        self.owners.contains(&address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeAccountConfig {
    pub owners: Vec<Address>,
    pub threshold: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_handler: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeDeploymentConfig {
    #[serde(with = "codec::decimal")]
    pub salt_nonce: U256,
    pub safe_version: SafeVersion,
}

/// An account that exists only as configuration at a predicted address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndeployedSafe {
    pub chain_id: u64,
    pub address: Address,
    pub safe_account_config: SafeAccountConfig,
    pub safe_deployment_config: SafeDeploymentConfig,
}

impl UndeployedSafe {
    pub fn account_state(&self) -> AccountState {
        AccountState {
            address: self.address,
            chain_id: self.chain_id,
            owners: self.safe_account_config.owners.clone(),
            threshold: self.safe_account_config.threshold,
            nonce: 0,
            version: self.safe_deployment_config.safe_version.clone(),
            deployed: false,
        }
    }
}

pub(crate) mod codec {
    use alloy::primitives::{Address, Bytes, U256};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use crate::error::CoreError;

    pub(crate) fn parse_u256(raw: &str) -> Result<U256, CoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(U256::ZERO);
        }
        if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            if hex.is_empty() {
                return Ok(U256::ZERO);
            }
            return U256::from_str_radix(hex, 16)
                .map_err(|e| CoreError::validation(format!("invalid hex integer '{raw}': {e}")));
        }
        U256::from_str_radix(raw, 10)
            .map_err(|e| CoreError::validation(format!("invalid integer '{raw}': {e}")))
    }

    pub(crate) fn parse_bytes(raw: &str) -> Result<Bytes, CoreError> {
        let raw = raw.trim();
        let body = raw.strip_prefix("0x").unwrap_or(raw);
        alloy::primitives::hex::decode(body)
            .map(Bytes::from)
            .map_err(|e| CoreError::validation(format!("invalid hex data: {e}")))
    }

    pub(crate) mod decimal {
        use super::*;

        pub(crate) fn serialize<S: Serializer>(value: &U256, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&value.to_string())
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
            match Value::deserialize(d)? {
                Value::String(s) => parse_u256(&s).map_err(serde::de::Error::custom),
                Value::Number(n) => parse_u256(&n.to_string()).map_err(serde::de::Error::custom),
                Value::Null => Ok(U256::ZERO),
                other => Err(serde::de::Error::custom(format!("invalid integer: {other}"))),
            }
        }
    }

    pub(crate) mod nonce {
        use super::*;

        pub(crate) fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_u64(*value)
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
            let value = super::decimal::deserialize(d)?;
            u64::try_from(value).map_err(|_| serde::de::Error::custom("nonce out of range"))
        }
    }

    pub(crate) mod hex_bytes {
        use super::*;

        pub(crate) fn serialize<S: Serializer>(value: &Bytes, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&value.to_string())
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse_bytes(&raw).map_err(serde::de::Error::custom),
                None => Ok(Bytes::new()),
            }
        }
    }

    pub(crate) mod address {
        use super::*;

        pub(crate) fn serialize<S: Serializer>(value: &Address, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&value.to_checksum(None))
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
            let raw = String::deserialize(d)?;
            crate::domain::parse_address(&raw).map_err(serde::de::Error::custom)
        }
    }
}
