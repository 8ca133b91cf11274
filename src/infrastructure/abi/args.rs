//! Parse textual arguments into ABI values for a known parameter type

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{FixedBytes, I256, U256};
use anyhow::{anyhow, bail, Context, Result};

use super::codec::parse_hex_address;

/// Parse argument values according to their types
pub fn parse_arguments(types: &[DynSolType], args: &[String]) -> Result<Vec<DynSolValue>> {
    if args.len() != types.len() {
        bail!(
            "Argument count mismatch: expected {} arguments, got {}",
            types.len(),
            args.len()
        );
    }

    types
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (ty, arg))| {
            parse_value(ty, arg).with_context(|| {
                format!("Failed to parse argument {} (type {})", i + 1, ty.sol_type_name())
            })
        })
        .collect()
}

/// Parse a single value according to its type
pub fn parse_value(ty: &DynSolType, arg: &str) -> Result<DynSolValue> {
    let arg = arg.trim();
    match ty {
        DynSolType::Address => parse_hex_address(arg)
            .map(DynSolValue::Address)
            .ok_or_else(|| anyhow!("Invalid address: expected 40 hex characters")),

        DynSolType::Bool => match arg.to_lowercase().as_str() {
            "true" | "1" => Ok(DynSolValue::Bool(true)),
            "false" | "0" => Ok(DynSolValue::Bool(false)),
            _ => bail!("Invalid bool: expected true/false, got '{}'", arg),
        },

        DynSolType::Int(size) => {
            let value = match strip_hex(arg) {
                Some(hex_str) => I256::from_be_bytes(left_pad(hex_str)?),
                None => arg
                    .replace('_', "")
                    .parse::<I256>()
                    .map_err(|e| anyhow!("Invalid integer: {}", e))?,
            };
            Ok(DynSolValue::Int(value, *size))
        }

        DynSolType::Uint(size) => {
            let value = match strip_hex(arg) {
                Some(hex_str) => U256::from_be_bytes(left_pad(hex_str)?),
                None => arg
                    .replace('_', "")
                    .parse::<U256>()
                    .map_err(|e| anyhow!("Invalid unsigned integer: {}", e))?,
            };
            Ok(DynSolValue::Uint(value, *size))
        }

        DynSolType::Bytes => {
            let hex_str = strip_hex(arg).unwrap_or(arg);
            let bytes = hex::decode(hex_str).context("Invalid hex")?;
            Ok(DynSolValue::Bytes(bytes))
        }

        DynSolType::FixedBytes(size) => {
            let hex_str = strip_hex(arg).unwrap_or(arg);
            let bytes = hex::decode(hex_str).context("Invalid hex")?;
            if bytes.len() != *size {
                bail!(
                    "Invalid bytes length: expected {} bytes, got {}",
                    size,
                    bytes.len()
                );
            }
            // FixedBytes values are right-padded to a full word
            let mut word = [0u8; 32];
            word[..bytes.len()].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(FixedBytes::from(word), *size))
        }

        DynSolType::String => {
            let s = if arg.len() >= 2
                && ((arg.starts_with('"') && arg.ends_with('"'))
                    || (arg.starts_with('\'') && arg.ends_with('\'')))
            {
                &arg[1..arg.len() - 1]
            } else {
                arg
            };
            Ok(DynSolValue::String(s.to_string()))
        }

        DynSolType::Array(inner_ty) => {
            let elements = split_enclosed(arg, '[', ']')?;
            let values = elements
                .iter()
                .map(|elem| parse_value(inner_ty, elem))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Array(values))
        }

        DynSolType::FixedArray(inner_ty, size) => {
            let elements = split_enclosed(arg, '[', ']')?;
            if elements.len() != *size {
                bail!(
                    "Fixed array size mismatch: expected {} elements, got {}",
                    size,
                    elements.len()
                );
            }
            let values = elements
                .iter()
                .map(|elem| parse_value(inner_ty, elem))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::FixedArray(values))
        }

        DynSolType::Tuple(types) => {
            let elements = split_enclosed(arg, '(', ')')?;
            if elements.len() != types.len() {
                bail!(
                    "Tuple size mismatch: expected {} elements, got {}",
                    types.len(),
                    elements.len()
                );
            }
            let values = types
                .iter()
                .zip(elements.iter())
                .map(|(ty, elem)| parse_value(ty, elem))
                .collect::<Result<Vec<_>>>()?;
            Ok(DynSolValue::Tuple(values))
        }

        _ => bail!("Unsupported type: {}", ty.sol_type_name()),
    }
}

fn strip_hex(arg: &str) -> Option<&str> {
    arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X"))
}

/// Parse hex into a left-padded 32-byte word; odd digit counts allowed
fn left_pad(hex_str: &str) -> Result<[u8; 32]> {
    let hex_str = hex_str.replace('_', "");
    let digits = if hex_str.len() % 2 == 1 {
        format!("0{}", hex_str)
    } else {
        hex_str
    };
    let bytes = hex::decode(&digits).context("Invalid hex")?;
    if bytes.len() > 32 {
        bail!(
            "Hex value too large: expected max 32 bytes, got {}",
            bytes.len()
        );
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(padded)
}

/// Split `[a,(b,c),[d]]` into top-level elements
fn split_enclosed(arg: &str, open: char, close: char) -> Result<Vec<String>> {
    let inner = arg
        .strip_prefix(open)
        .and_then(|rest| rest.strip_suffix(close))
        .ok_or_else(|| anyhow!("Expected value enclosed in {}{}", open, close))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '[' | '(' => {
                depth += 1;
                current.push(c);
            }
            ']' | ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| anyhow!("Unbalanced '{}' in {}", c, arg))?;
                current.push(c);
            }
            ',' if depth == 0 => {
                elements.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        bail!("Unbalanced brackets in {}", arg);
    }
    elements.push(current.trim().to_string());
    Ok(elements)
}
