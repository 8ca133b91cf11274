//! ABI argument codec using alloy-dyn-abi
//!
//! Word-level packing is delegated to alloy-dyn-abi. What lives here is the
//! humanization of decoded values and the fallback to `<?>` placeholders when
//! calldata does not fit the resolved function.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::Address;
use anyhow::{bail, Context, Result};

use crate::domain::abi::{DecodedArg, FunctionSignature};

/// Byte values longer than this are shown as a shortened hash
const HASH_DISPLAY_THRESHOLD: usize = 24;

/// Parse the canonical parameter types of a function
pub fn param_types(function: &FunctionSignature) -> Result<Vec<DynSolType>> {
    function
        .inputs
        .iter()
        .map(|param| {
            param.kind.parse::<DynSolType>().with_context(|| {
                format!("Failed to parse type '{}' for param '{}'", param.kind, param.name)
            })
        })
        .collect()
}

/// Decode argument bytes (calldata without selector) into raw values
pub fn decode_values(types: &[DynSolType], data: &[u8]) -> Result<Vec<DynSolValue>> {
    if types.is_empty() {
        return Ok(Vec::new());
    }
    let tuple_type = DynSolType::Tuple(types.to_vec());
    let decoded = tuple_type
        .abi_decode_params(data)
        .context("Failed to decode calldata")?;

    match decoded {
        DynSolValue::Tuple(values) => Ok(values),
        other => Ok(vec![other]),
    }
}

/// Decode and humanize the arguments of `function`
///
/// Never fails: calldata that does not fit the resolved ABI (proxies,
/// non-standard functions) yields a `<?>` placeholder per argument.
pub fn decode_args(function: &FunctionSignature, data: &[u8]) -> Vec<DecodedArg> {
    let decoded = param_types(function).and_then(|types| decode_values(&types, data));

    match decoded {
        Ok(values) => function
            .inputs
            .iter()
            .zip(values)
            .enumerate()
            .map(|(idx, (param, value))| DecodedArg {
                name: function.arg_name(idx),
                kind: param.kind.clone(),
                display: humanize(&value),
                raw: Some(value),
            })
            .collect(),
        Err(err) => {
            tracing::debug!(
                function = %function.signature,
                error = %err,
                "calldata does not fit resolved ABI"
            );
            function
                .inputs
                .iter()
                .enumerate()
                .map(|(idx, param)| DecodedArg::undecoded(function.arg_name(idx), param.kind.clone()))
                .collect()
        }
    }
}

/// Encode a call: selector followed by the packed arguments
pub fn encode_call(function: &FunctionSignature, values: &[DynSolValue]) -> Result<Vec<u8>> {
    let types = param_types(function)?;
    check_values(&types, values)?;

    let mut calldata = function.selector.to_vec();
    if !values.is_empty() {
        let tuple_value = DynSolValue::Tuple(values.to_vec());
        calldata.extend_from_slice(&tuple_value.abi_encode_params());
    }
    Ok(calldata)
}

/// Check argument count and types against a parameter list
pub fn check_values(types: &[DynSolType], values: &[DynSolValue]) -> Result<()> {
    if types.len() != values.len() {
        bail!(
            "Argument count mismatch: expected {} arguments, got {}",
            types.len(),
            values.len()
        );
    }
    for (idx, (ty, value)) in types.iter().zip(values).enumerate() {
        if !ty.matches(value) {
            bail!(
                "argument {} does not match type {}: {}",
                idx,
                ty.sol_type_name(),
                humanize(value)
            );
        }
    }
    Ok(())
}

/// Pick the overload whose parameter types accept `values`
pub fn select_overload<'a>(
    candidates: &[&'a FunctionSignature],
    values: &[DynSolValue],
) -> Option<&'a FunctionSignature> {
    candidates.iter().copied().find(|function| {
        param_types(function)
            .map(|types| check_values(&types, values).is_ok())
            .unwrap_or(false)
    })
}

/// Render a decoded value for display
pub fn humanize(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::FixedBytes(word, size) => humanize_bytes(&word.as_slice()[..(*size).min(32)]),
        DynSolValue::Bytes(bytes) => humanize_bytes(bytes),
        DynSolValue::String(s) => humanize_str(s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let items: Vec<String> = items.iter().map(humanize).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(humanize).collect();
            format!("({})", items.join(", "))
        }
    }
}

/// Text if the bytes are clean UTF-8, then short hash, then address, then hex
pub fn humanize_bytes(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|pos| pos + 1)
        .unwrap_or(0);
    if let Ok(text) = std::str::from_utf8(&bytes[..end]) {
        return format!("'{}'", escape_controls(text));
    }

    if bytes.len() > HASH_DISPLAY_THRESHOLD {
        return humanize_hash(bytes);
    }

    if bytes.len() == 20 {
        return Address::from_slice(bytes).to_checksum(None);
    }

    format!("0x{}", hex::encode(bytes))
}

/// Control characters as `\u{..}` escapes so rendered text stays on one line
fn escape_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}

/// Addresses are checksummed, other non-empty strings quoted
pub fn humanize_str(s: &str) -> String {
    if let Some(address) = parse_hex_address(s) {
        return address.to_checksum(None);
    }
    if s.is_empty() {
        return String::new();
    }
    format!("\"{}\"", s)
}

/// First and last two bytes of a long blob, e.g. `3f1a..9c2e`
pub fn humanize_hash(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    let head = &encoded[..4.min(encoded.len())];
    let tail = &encoded[encoded.len().saturating_sub(4)..];
    format!("{}..{}", head, tail)
}

/// Strict 40-hex-digit address, `0x` optional
pub fn parse_hex_address(s: &str) -> Option<Address> {
    let payload = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if payload.len() != 40 || !payload.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = hex::decode(payload).ok()?;
    Some(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{ParamSpec, UNDECODED_PLACEHOLDER};
    use alloy_primitives::{address, U256};

    fn make_transfer_function() -> FunctionSignature {
        FunctionSignature {
            selector: [0xa9, 0x05, 0x9c, 0xbb],
            name: "transfer".to_string(),
            signature: "transfer(address,uint256)".to_string(),
            inputs: vec![
                ParamSpec {
                    name: "to".to_string(),
                    kind: "address".to_string(),
                },
                ParamSpec {
                    name: "amount".to_string(),
                    kind: "uint256".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_decode_transfer() {
        let function = make_transfer_function();

        // transfer(0x1234567890123456789012345678901234567890, 1000) without selector
        let data = hex::decode(
            "000000000000000000000000123456789012345678901234567890123456789000000000000000000000000000000000000000000000000000000000000003e8"
        ).unwrap();

        let args = decode_args(&function, &data);

        assert_eq!(args.len(), 2);
        assert_eq!(args[0].name, "to");
        assert_eq!(args[0].display, "0x1234567890123456789012345678901234567890");
        assert_eq!(args[1].name, "amount");
        assert_eq!(args[1].display, "1000");
        assert_eq!(args[1].raw, Some(DynSolValue::Uint(U256::from(1000), 256)));
    }

    #[test]
    fn test_short_calldata_yields_placeholders() {
        let function = make_transfer_function();
        let args = decode_args(&function, &[0u8; 10]);

        assert_eq!(args.len(), 2);
        assert!(args.iter().all(|a| a.display == UNDECODED_PLACEHOLDER && a.raw.is_none()));
        assert_eq!(args[1].name, "amount");
    }

    #[test]
    fn test_encode_then_decode() {
        let function = make_transfer_function();
        let values = vec![
            DynSolValue::Address(address!("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0")),
            DynSolValue::Uint(U256::from(1_000_000u64), 256),
        ];
        let calldata = encode_call(&function, &values).unwrap();
        assert_eq!(&calldata[..4], &[0xa9, 0x05, 0x9c, 0xbb]);

        let args = decode_args(&function, &calldata[4..]);
        let raw: Vec<DynSolValue> = args.into_iter().filter_map(|a| a.raw).collect();
        assert_eq!(raw, values);
    }

    #[test]
    fn test_encode_rejects_mismatch() {
        let function = make_transfer_function();

        let err = encode_call(&function, &[DynSolValue::Bool(true)]).unwrap_err();
        assert!(err.to_string().contains("Argument count mismatch"));

        let err = encode_call(
            &function,
            &[DynSolValue::Bool(true), DynSolValue::Uint(U256::from(1), 256)],
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not match type address"));
    }

    #[test]
    fn test_humanize_bytes() {
        // trailing NULs trimmed before the UTF-8 attempt
        let mut name = b"crvUSD".to_vec();
        name.resize(32, 0);
        assert_eq!(humanize_bytes(&name), "'crvUSD'");

        // long binary blob shortened
        let blob: Vec<u8> = (0xd0..=0xff).collect();
        assert_eq!(humanize_bytes(&blob), "d0d1..feff");

        // 20 binary bytes rendered as a checksummed address
        let addr = address!("0xbeF434E2aCF0FBaD1f0579d2376fED0d1CfC4217");
        assert_eq!(
            humanize_bytes(addr.as_slice()),
            "0xbeF434E2aCF0FBaD1f0579d2376fED0d1CfC4217"
        );

        // short binary falls back to hex
        assert_eq!(humanize_bytes(&[0xff, 0x01]), "0xff01");
    }

    #[test]
    fn test_humanize_bytes_with_control_characters() {
        // valid UTF-8 is text even with control bytes; they are escaped
        assert_eq!(humanize_bytes(&[0x01, b'h', b'i']), "'\\u{1}hi'");
        assert_eq!(humanize_bytes(b"a\nb\0\0"), "'a\\nb'");
    }

    #[test]
    fn test_humanize_strings() {
        assert_eq!(
            humanize_str("0xdc24316b9ae028f1497c275eb9192a3ea0f67022"),
            "0xDC24316b9AE028F1497c275EB9192a3Ea0f67022"
        );
        assert_eq!(humanize_str("hello"), "\"hello\"");
        assert_eq!(humanize_str(""), "");
    }

    #[test]
    fn test_humanize_nested() {
        let value = DynSolValue::Tuple(vec![
            DynSolValue::Bool(true),
            DynSolValue::Array(vec![
                DynSolValue::Uint(U256::from(1), 256),
                DynSolValue::Uint(U256::from(2), 256),
            ]),
        ]);
        assert_eq!(humanize(&value), "(true, [1, 2])");
    }

    #[test]
    fn test_select_overload() {
        let single = FunctionSignature {
            selector: [1, 0, 0, 0],
            name: "commit".to_string(),
            signature: "commit(uint256)".to_string(),
            inputs: vec![ParamSpec {
                name: "fee".to_string(),
                kind: "uint256".to_string(),
            }],
        };
        let pair = FunctionSignature {
            selector: [2, 0, 0, 0],
            name: "commit".to_string(),
            signature: "commit(uint256,bool)".to_string(),
            inputs: vec![
                ParamSpec {
                    name: "fee".to_string(),
                    kind: "uint256".to_string(),
                },
                ParamSpec {
                    name: "now".to_string(),
                    kind: "bool".to_string(),
                },
            ],
        };
        let candidates = vec![&single, &pair];
        let values = vec![DynSolValue::Uint(U256::from(5), 256), DynSolValue::Bool(false)];
        assert_eq!(select_overload(&candidates, &values).unwrap().selector, [2, 0, 0, 0]);
        assert!(select_overload(&candidates, &[DynSolValue::Bool(false)]).is_none());
    }
}
