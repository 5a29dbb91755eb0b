//! dApp session requests: method parsing, rejection codes, expiry and stale-session detection.

use std::fmt;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{codec, parse_address, Operation, SafeMessagePayload, SafeTransaction};

pub const USER_REJECTED: i64 = 4001;
pub const UNAUTHORIZED: i64 = 4100;
pub const UNSUPPORTED_METHOD: i64 = 4200;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Substrings relayers use once a session or request no longer exists.
const STALE_SESSION_MARKERS: &[&str] = &[
    "no matching key",
    "session topic doesn't exist",
    "record was recently deleted",
    "missing or invalid",
    "expired",
    "pending request not found",
];

pub fn is_stale_session_error(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    STALE_SESSION_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestMethod {
    #[serde(rename = "eth_sendTransaction")]
    EthSendTransaction,
    #[serde(rename = "personal_sign")]
    PersonalSign,
    #[serde(rename = "eth_sign")]
    EthSign,
    #[serde(rename = "eth_signTypedData")]
    EthSignTypedData,
    #[serde(rename = "eth_signTypedData_v4")]
    EthSignTypedDataV4,
}

impl RequestMethod {
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "eth_sendTransaction" => Some(Self::EthSendTransaction),
            "personal_sign" => Some(Self::PersonalSign),
            "eth_sign" => Some(Self::EthSign),
            "eth_signTypedData" => Some(Self::EthSignTypedData),
            "eth_signTypedData_v4" => Some(Self::EthSignTypedDataV4),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EthSendTransaction => "eth_sendTransaction",
            Self::PersonalSign => "personal_sign",
            Self::EthSign => "eth_sign",
            Self::EthSignTypedData => "eth_signTypedData",
            Self::EthSignTypedDataV4 => "eth_signTypedData_v4",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub chain_id: u64,
    /// Stamped on intake when the source does not provide it.
    #[serde(default)]
    pub received_at_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestIntent {
    /// Nonce is assigned when the transaction is queued.
    Transaction(SafeTransaction),
    Message {
        method: RequestMethod,
        payload: SafeMessagePayload,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRejection {
    pub code: i64,
    pub message: String,
}

impl RequestRejection {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED, "User rejected the request")
    }

    pub fn abandoned() -> Self {
        Self::new(USER_REJECTED, "Request abandoned")
    }

    pub fn expired() -> Self {
        Self::new(USER_REJECTED, "request expired")
    }

    /// Intake failed after the request was accepted for parsing.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }
}

impl fmt::Display for RequestRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

pub fn is_expired(received_at_ms: u64, now_ms: u64, ttl_ms: u64) -> bool {
    now_ms.saturating_sub(received_at_ms) > ttl_ms
}

/// Turns a request addressed to `account` on `chain_id` into a transaction or message intent.
pub fn parse_request(
    request: &SessionRequest,
    account: Address,
    chain_id: u64,
) -> Result<RequestIntent, RequestRejection> {
    let method = RequestMethod::parse(&request.method).ok_or_else(|| {
        RequestRejection::new(
            UNSUPPORTED_METHOD,
            format!("unsupported method {}", request.method),
        )
    })?;
    if request.chain_id != chain_id {
        return Err(RequestRejection::new(
            UNAUTHORIZED,
            format!("request targets chain {}, account is on {chain_id}", request.chain_id),
        ));
    }
    let params = request
        .params
        .as_array()
        .ok_or_else(|| RequestRejection::invalid("params must be an array"))?;

    match method {
        RequestMethod::EthSendTransaction => {
            let tx = params
                .first()
                .and_then(Value::as_object)
                .ok_or_else(|| RequestRejection::invalid("missing transaction object"))?;
            if let Some(from) = tx.get("from").and_then(Value::as_str) {
                ensure_account(from, account)?;
            }
            let to = tx
                .get("to")
                .and_then(Value::as_str)
                .ok_or_else(|| RequestRejection::invalid("contract creation is not supported"))?;
            let to = parse_address(to).map_err(|e| RequestRejection::invalid(e.to_string()))?;
            let value = match tx.get("value") {
                Some(Value::String(s)) => {
                    codec::parse_u256(s).map_err(|e| RequestRejection::invalid(e.to_string()))?
                }
                Some(Value::Number(n)) => codec::parse_u256(&n.to_string())
                    .map_err(|e| RequestRejection::invalid(e.to_string()))?,
                _ => U256::ZERO,
            };
            let data = match tx.get("data").or_else(|| tx.get("input")).and_then(Value::as_str) {
                Some(raw) => {
                    codec::parse_bytes(raw).map_err(|e| RequestRejection::invalid(e.to_string()))?
                }
                None => Bytes::new(),
            };
            Ok(RequestIntent::Transaction(SafeTransaction::new(
                to,
                value,
                data,
                Operation::Call,
            )))
        }
        RequestMethod::PersonalSign => {
            let (message, address) = two_params(params)?;
            ensure_account(address_str(address)?, account)?;
            Ok(RequestIntent::Message {
                method,
                payload: SafeMessagePayload::personal_sign(message_str(message)?),
            })
        }
        RequestMethod::EthSign => {
            let (address, message) = two_params(params)?;
            ensure_account(address_str(address)?, account)?;
            Ok(RequestIntent::Message {
                method,
                payload: SafeMessagePayload::eth_sign(message_str(message)?),
            })
        }
        RequestMethod::EthSignTypedData | RequestMethod::EthSignTypedDataV4 => {
            let (address, data) = two_params(params)?;
            ensure_account(address_str(address)?, account)?;
            let payload = SafeMessagePayload::typed_data(data)
                .map_err(|e| RequestRejection::invalid(e.to_string()))?;
            Ok(RequestIntent::Message { method, payload })
        }
    }
}

/// The value returned to the dApp once a request is approved.
pub fn transaction_response(safe_tx_hash: B256) -> Value {
    Value::String(safe_tx_hash.to_string())
}

pub fn message_response(encoded_signatures: &Bytes) -> Value {
    Value::String(encoded_signatures.to_string())
}

fn two_params(params: &[Value]) -> Result<(&Value, &Value), RequestRejection> {
    match params {
        [first, second, ..] => Ok((first, second)),
        _ => Err(RequestRejection::invalid("expected two params")),
    }
}

fn address_str(value: &Value) -> Result<&str, RequestRejection> {
    value
        .as_str()
        .ok_or_else(|| RequestRejection::invalid("address param must be a string"))
}

fn message_str(value: &Value) -> Result<&str, RequestRejection> {
    value
        .as_str()
        .ok_or_else(|| RequestRejection::invalid("message param must be a string"))
}

fn ensure_account(raw: &str, account: Address) -> Result<(), RequestRejection> {
    let address = parse_address(raw).map_err(|e| RequestRejection::invalid(e.to_string()))?;
    if address != account {
        return Err(RequestRejection::new(
            UNAUTHORIZED,
            format!("request is for {address}, not {account}"),
        ));
    }
    Ok(())
}
