use std::str::FromStr;

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes, FixedBytes, I256, U256};
use serde_json::Value;

use rusty_safe_multisig_core::{AbiPort, PortError};

/// Encodes contract calls from a JSON ABI and string arguments.
///
/// Scalar arguments are plain text; booleans, arrays and tuples are JSON.
#[derive(Debug, Clone, Default)]
pub struct AbiEncoder;

impl AbiPort for AbiEncoder {
    fn encode_calldata(
        &self,
        abi_json: &str,
        method: &str,
        args: &[String],
    ) -> Result<Bytes, PortError> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| PortError::Validation(format!("invalid abi json: {e}")))?;
        let function = select_function(&abi, method)?;
        if function.inputs.len() != args.len() {
            return Err(PortError::Validation(format!(
                "{} takes {} arguments, got {}",
                function.signature(),
                function.inputs.len(),
                args.len()
            )));
        }

        let values = function
            .inputs
            .iter()
            .zip(args)
            .map(|(input, arg)| {
                let ty: DynSolType = input.ty.parse().map_err(|e| {
                    PortError::Validation(format!("unsupported type '{}': {e}", input.ty))
                })?;
                let parsed = match ty {
                    DynSolType::Bool
                    | DynSolType::Array(_)
                    | DynSolType::FixedArray(..)
                    | DynSolType::Tuple(_) => serde_json::from_str::<Value>(arg)
                        .unwrap_or_else(|_| Value::String(arg.clone())),
                    // Scalars stay text so large integers keep their precision.
                    _ => Value::String(arg.trim().to_owned()),
                };
                parse_value(&parsed, &ty).map_err(|e| {
                    PortError::Validation(format!("argument '{}': {e}", input.name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let encoded = function
            .abi_encode_input(&values)
            .map_err(|e| PortError::Validation(format!("abi encoding failed: {e}")))?;
        tracing::debug!(method = %function.signature(), bytes = encoded.len(), "encoded calldata");
        Ok(Bytes::from(encoded))
    }
}

/// `transfer` picks the first overload; `transfer(address,uint256)` picks exactly that one.
fn select_function<'a>(abi: &'a JsonAbi, method: &str) -> Result<&'a Function, PortError> {
    let name = method.split_once('(').map_or(method, |(name, _)| name).trim();
    let candidates = abi
        .function(name)
        .ok_or_else(|| PortError::Validation(format!("method not found: {name}")))?;

    if method.contains('(') {
        let wanted: String = method.chars().filter(|c| !c.is_whitespace()).collect();
        return candidates
            .iter()
            .find(|f| f.signature() == wanted)
            .ok_or_else(|| PortError::Validation(format!("method signature not found: {wanted}")));
    }
    candidates
        .first()
        .ok_or_else(|| PortError::Validation(format!("method not found: {name}")))
}

fn parse_value(value: &Value, ty: &DynSolType) -> Result<DynSolValue, String> {
    match ty {
        DynSolType::Bool => match value {
            Value::Bool(b) => Ok(DynSolValue::Bool(*b)),
            _ => Err("expected bool".to_owned()),
        },
        DynSolType::Uint(bits) => {
            let raw = number_text(value).ok_or("expected uint string or number")?;
            U256::from_str(&raw)
                .map(|x| DynSolValue::Uint(x, *bits))
                .map_err(|e| format!("invalid uint: {e}"))
        }
        DynSolType::Int(bits) => {
            let raw = number_text(value).ok_or("expected int string or number")?;
            I256::from_str(&raw)
                .map(|x| DynSolValue::Int(x, *bits))
                .map_err(|e| format!("invalid int: {e}"))
        }
        DynSolType::Address => Address::from_str(text(value, "address")?)
            .map(DynSolValue::Address)
            .map_err(|e| format!("invalid address: {e}")),
        DynSolType::FixedBytes(size) => {
            let raw = Bytes::from_str(text(value, "fixed bytes")?)
                .map_err(|e| format!("invalid fixed bytes: {e}"))?;
            if raw.len() != *size {
                return Err(format!("expected {size} bytes, got {}", raw.len()));
            }
            let mut word = [0u8; 32];
            word[..raw.len()].copy_from_slice(&raw);
            Ok(DynSolValue::FixedBytes(FixedBytes::from(word), *size))
        }
        DynSolType::Bytes => Bytes::from_str(text(value, "bytes")?)
            .map(|x| DynSolValue::Bytes(x.to_vec()))
            .map_err(|e| format!("invalid bytes: {e}")),
        DynSolType::String => text(value, "string").map(|s| DynSolValue::String(s.to_owned())),
        DynSolType::Array(inner) => Ok(DynSolValue::Array(parse_items(value, inner, None)?)),
        DynSolType::FixedArray(inner, size) => Ok(DynSolValue::FixedArray(parse_items(
            value,
            inner,
            Some(*size),
        )?)),
        DynSolType::Tuple(inner) => {
            let items = value.as_array().ok_or("expected tuple as array")?;
            if items.len() != inner.len() {
                return Err(format!(
                    "tuple has {} fields, got {}",
                    inner.len(),
                    items.len()
                ));
            }
            items
                .iter()
                .zip(inner)
                .map(|(v, t)| parse_value(v, t))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        other => Err(format!("type {other} is not supported")),
    }
}

fn parse_items(
    value: &Value,
    inner: &DynSolType,
    expected_len: Option<usize>,
) -> Result<Vec<DynSolValue>, String> {
    let items = value.as_array().ok_or("expected array")?;
    if let Some(len) = expected_len.filter(|len| *len != items.len()) {
        return Err(format!("expected {len} items, got {}", items.len()));
    }
    items.iter().map(|v| parse_value(v, inner)).collect()
}

fn number_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text<'a>(value: &'a Value, what: &str) -> Result<&'a str, String> {
    value.as_str().ok_or_else(|| format!("expected {what} string"))
}
