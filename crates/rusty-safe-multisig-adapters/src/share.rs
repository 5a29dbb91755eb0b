//! Share links: a queue bundle, message or signature packed into one URL query
//! parameter (`importTx`, `importMsg`, `importSig`) as base64url JSON.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use rusty_safe_multisig_core::{
    MessageBundle, PortError, QueueKey, SignatureShare, SigningCommand, TransactionBundle,
};

pub const IMPORT_TX: &str = "importTx";
pub const IMPORT_MSG: &str = "importMsg";
pub const IMPORT_SIG: &str = "importSig";

/// Decoded link payloads larger than this are refused.
pub const MAX_PAYLOAD_BYTES: usize = 256 * 1024;

/// Longest base64url text that can decode to at most [`MAX_PAYLOAD_BYTES`].
const MAX_ENCODED_LEN: usize = MAX_PAYLOAD_BYTES.div_ceil(3) * 4;

#[derive(Debug, Clone, PartialEq)]
pub enum SharePayload {
    /// Raw JSON blob, merged as-is by the queue.
    Transactions(String),
    Message(String),
    Signature(SignatureShare),
}

impl SharePayload {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Transactions(_) => IMPORT_TX,
            Self::Message(_) => IMPORT_MSG,
            Self::Signature(_) => IMPORT_SIG,
        }
    }

    pub fn into_command(self, key: QueueKey) -> SigningCommand {
        match self {
            Self::Transactions(blob) => SigningCommand::ImportTransactions { key, blob },
            Self::Message(blob) => SigningCommand::ImportMessage { key, blob },
            Self::Signature(share) => SigningCommand::ImportSignature { key, share },
        }
    }
}

pub fn transactions_link(base_url: &str, bundle: &TransactionBundle) -> Result<String, PortError> {
    link(base_url, IMPORT_TX, &to_json(bundle)?)
}

pub fn message_link(base_url: &str, bundle: &MessageBundle) -> Result<String, PortError> {
    link(base_url, IMPORT_MSG, &to_json(bundle)?)
}

pub fn signature_link(base_url: &str, share: &SignatureShare) -> Result<String, PortError> {
    link(base_url, IMPORT_SIG, &to_json(share)?)
}

/// Accepts a full URL, a bare query string, or `key=value`.
pub fn parse_link(input: &str) -> Result<SharePayload, PortError> {
    let query = input
        .split_once('?')
        .map_or(input, |(_, query)| query)
        .split('#')
        .next()
        .unwrap_or_default();

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if ![IMPORT_TX, IMPORT_MSG, IMPORT_SIG].contains(&key) {
            continue;
        }
        let json = decode_payload(value)?;
        return match key {
            IMPORT_TX => Ok(SharePayload::Transactions(json)),
            IMPORT_MSG => Ok(SharePayload::Message(json)),
            _ => serde_json::from_str(&json)
                .map(SharePayload::Signature)
                .map_err(|e| PortError::Validation(format!("invalid importSig payload: {e}"))),
        };
    }
    Err(PortError::Validation(
        "no importTx, importMsg or importSig parameter found".to_owned(),
    ))
}

fn link(base_url: &str, key: &str, json: &str) -> Result<String, PortError> {
    if json.len() > MAX_PAYLOAD_BYTES {
        return Err(PortError::Validation(format!(
            "share payload is {} bytes, limit is {MAX_PAYLOAD_BYTES}",
            json.len()
        )));
    }
    let separator = if base_url.contains('?') { '&' } else { '?' };
    Ok(format!(
        "{base_url}{separator}{key}={}",
        URL_SAFE_NO_PAD.encode(json)
    ))
}

fn decode_payload(value: &str) -> Result<String, PortError> {
    // Some clients keep the padding and percent-encode it.
    let trimmed = value.trim().trim_end_matches("%3D").trim_end_matches('=');
    if trimmed.len() > MAX_ENCODED_LEN {
        return Err(PortError::Validation(format!(
            "encoded share payload is {} characters, limit is {MAX_ENCODED_LEN}",
            trimmed.len()
        )));
    }
    let raw = URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| PortError::Validation(format!("share payload is not base64url: {e}")))?;
    if raw.len() > MAX_PAYLOAD_BYTES {
        return Err(PortError::Validation(format!(
            "share payload is {} bytes, limit is {MAX_PAYLOAD_BYTES}",
            raw.len()
        )));
    }
    String::from_utf8(raw)
        .map_err(|e| PortError::Validation(format!("share payload is not utf-8: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PortError> {
    serde_json::to_string(value)
        .map_err(|e| PortError::Validation(format!("serialize share payload: {e}")))
}
