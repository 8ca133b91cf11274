//! EVM script decoder
//!
//! Framing errors abort the whole decode. Everything after framing is
//! per-entry: a missing ABI or unknown selector marks that entry as failed
//! and decoding carries on with the next one.

use std::collections::HashSet;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, Selector};
use futures::future::join_all;

use crate::domain::abi::{AbiBook, DecodeFailure, DecodedArg, DecodedCall, DecodedEntry, FunctionSignature};
use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::{AbiSource, EvmScript, ScriptEntry};
use crate::infrastructure::abi::{decode_args, resolve_function};

use super::agent::{execute_function, EXECUTE_SELECTOR};

/// How many `execute` wrappers are unwrapped per entry
///
/// Deeper wrappers are reported as ordinary `execute` calls, which keeps
/// adversarial scripts from recursing.
pub const MAX_FORWARD_DEPTH: usize = 1;

/// A call resolved against one contract's ABI
#[derive(Debug, Clone)]
struct ResolvedCall {
    target: Address,
    function: FunctionSignature,
    arguments: Vec<DecodedArg>,
}

/// Result of the selector check on a resolved call
#[derive(Debug, Clone, PartialEq)]
pub enum CallShape {
    Direct,
    /// `execute(target, value, calldata)` forwarding to another contract
    Forwarded { target: Address, calldata: Bytes },
}

fn classify(call: &ResolvedCall) -> CallShape {
    if call.function.selector != EXECUTE_SELECTOR {
        return CallShape::Direct;
    }
    let target = call.arguments.first().and_then(|a| a.raw.as_ref());
    let calldata = call.arguments.get(2).and_then(|a| a.raw.as_ref());
    match (target, calldata) {
        (Some(DynSolValue::Address(target)), Some(DynSolValue::Bytes(calldata))) => {
            CallShape::Forwarded {
                target: *target,
                calldata: Bytes::copy_from_slice(calldata),
            }
        }
        _ => CallShape::Direct,
    }
}

fn resolve_call(target: Address, calldata: &[u8], abis: &AbiBook) -> GovernanceResult<ResolvedCall> {
    let selector: [u8; 4] = match calldata.get(..4).and_then(|s| <[u8; 4]>::try_from(s).ok()) {
        Some(selector) => selector,
        None => {
            let mut padded = [0u8; 4];
            padded[..calldata.len()].copy_from_slice(calldata);
            return Err(GovernanceError::SelectorNotFound {
                address: target,
                selector: Selector::from(padded),
            });
        }
    };

    let resolved = match abis.get(&target) {
        Some(abi) => match resolve_function(abi, target, selector) {
            Ok(function) => Some(function.clone()),
            // Agents are proxies; their published ABI may lack `execute`
            Err(_) if selector == EXECUTE_SELECTOR => None,
            Err(err) => return Err(err),
        },
        None if selector == EXECUTE_SELECTOR => None,
        None => return Err(GovernanceError::AbiUnavailable(target)),
    };
    let function = resolved.unwrap_or_else(execute_function);

    let arguments = decode_args(&function, &calldata[4..]);
    Ok(ResolvedCall {
        target,
        function,
        arguments,
    })
}

fn decode_call(entry: &ScriptEntry, abis: &AbiBook) -> GovernanceResult<DecodedCall> {
    let mut agent = None;
    let mut call = resolve_call(entry.target, &entry.calldata, abis)?;

    for _ in 0..MAX_FORWARD_DEPTH {
        match classify(&call) {
            CallShape::Direct => break,
            CallShape::Forwarded { target, calldata } => {
                tracing::debug!(agent = %call.target, %target, "unwrapping forwarded call");
                agent = Some(call.target);
                call = resolve_call(target, &calldata, abis)?;
            }
        }
    }

    Ok(DecodedCall {
        agent,
        target: call.target,
        function_name: call.function.name,
        signature: call.function.signature,
        arguments: call.arguments,
    })
}

/// Decode already-framed entries
pub fn decode_entries(entries: &[ScriptEntry], abis: &AbiBook) -> Vec<DecodedEntry> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            decode_call(entry, abis).map_err(|error| DecodeFailure {
                index,
                target: entry.target,
                error,
            })
        })
        .collect()
}

/// Decode a script against pre-fetched ABIs
pub fn decode_script(script: &EvmScript, abis: &AbiBook) -> GovernanceResult<Vec<DecodedEntry>> {
    let entries = script.parse()?;
    Ok(decode_entries(&entries, abis))
}

/// Decode a script, fetching every ABI it needs from `source`
///
/// Outer targets are fetched concurrently up front; targets discovered by
/// unwrapping `execute` are fetched in a second round. The result is in
/// script order regardless of fetch completion order.
pub async fn decode_with_source(
    script: &EvmScript,
    source: &dyn AbiSource,
    abis: &mut AbiBook,
) -> GovernanceResult<Vec<DecodedEntry>> {
    let entries = script.parse()?;
    let mut attempted: HashSet<Address> = HashSet::new();
    let mut pending: Vec<Address> = unique(entries.iter().map(|e| e.target));

    loop {
        fetch_missing(source, abis, &pending, &mut attempted).await;

        let decoded = decode_entries(&entries, abis);
        pending = unique(decoded.iter().filter_map(|entry| match entry {
            Err(DecodeFailure {
                error: GovernanceError::AbiUnavailable(address),
                ..
            }) if !attempted.contains(address) => Some(*address),
            _ => None,
        }));

        if pending.is_empty() {
            return Ok(decoded);
        }
    }
}

/// Fetch ABIs not yet in `abis`, concurrently
pub async fn fetch_missing(
    source: &dyn AbiSource,
    abis: &mut AbiBook,
    addresses: &[Address],
    attempted: &mut HashSet<Address>,
) {
    let wanted: Vec<Address> = addresses
        .iter()
        .copied()
        .filter(|address| !abis.contains(address) && attempted.insert(*address))
        .collect();
    if wanted.is_empty() {
        return;
    }

    let results = join_all(wanted.iter().map(|address| source.fetch_abi(*address))).await;
    for (address, result) in wanted.into_iter().zip(results) {
        match result {
            Ok(abi) => abis.insert(address, abi),
            Err(err) => tracing::warn!(%address, source = source.name(), error = %err, "ABI fetch failed"),
        }
    }
}

fn unique(addresses: impl Iterator<Item = Address>) -> Vec<Address> {
    let mut seen = HashSet::new();
    addresses.filter(|address| seen.insert(*address)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{ContractAbi, UNDECODED_PLACEHOLDER};
    use crate::infrastructure::abi::parse_contract_abi;
    use crate::infrastructure::script::agent::wrap_execute;
    use alloy_primitives::{address, U256};

    const AGENT: Address = address!("0x40907540d8a6C65c637785e8f8B742ae6b0b9968");
    const FEE_PROXY: Address = address!("0xeCb456EA5365865EbAb8a2661B0c503410e9B347");
    const POOL: Address = address!("0xDC24316b9AE028F1497c275EB9192a3Ea0f67022");

    const FEE_ABI: &str = r#"[
        {"type":"function","name":"commit_new_fee","stateMutability":"nonpayable",
         "inputs":[{"name":"_pool","type":"address"},{"name":"new_fee","type":"uint256"},
                   {"name":"new_admin_fee","type":"uint256"}],"outputs":[]}
    ]"#;

    fn commit_calldata() -> Vec<u8> {
        let abi = parse_contract_abi(FEE_ABI).unwrap();
        let function = abi.resolve_by_name("commit_new_fee")[0].clone();
        crate::infrastructure::abi::encode_call(
            &function,
            &[
                DynSolValue::Address(POOL),
                DynSolValue::Uint(U256::from(1_000_000u64), 256),
                DynSolValue::Uint(U256::from(5_000_000_000u64), 256),
            ],
        )
        .unwrap()
    }

    fn book() -> AbiBook {
        let mut abis = AbiBook::new();
        abis.insert(FEE_PROXY, parse_contract_abi(FEE_ABI).unwrap());
        abis
    }

    #[test]
    fn test_forwarded_call_without_agent_abi() {
        let script = EvmScript::from_entries(&[ScriptEntry::new(
            AGENT,
            wrap_execute(FEE_PROXY, commit_calldata()),
        )])
        .unwrap();

        let decoded = decode_script(&script, &book()).unwrap();
        assert_eq!(decoded.len(), 1);
        let call = decoded[0].as_ref().unwrap();
        assert_eq!(call.agent, Some(AGENT));
        assert_eq!(call.target, FEE_PROXY);
        assert_eq!(call.function_name, "commit_new_fee");
        let names: Vec<&str> = call.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["_pool", "new_fee", "new_admin_fee"]);
        assert_eq!(call.arguments[0].display, "0xDC24316b9AE028F1497c275EB9192a3Ea0f67022");
        assert_eq!(call.arguments[2].display, "5000000000");
    }

    #[test]
    fn test_forwarded_call_when_agent_abi_lacks_execute() {
        // Proxy agents publish the proxy ABI, not the implementation's
        let mut abis = book();
        abis.insert(
            AGENT,
            parse_contract_abi(
                r#"[{"type":"function","name":"implementation","stateMutability":"view",
                     "inputs":[],"outputs":[{"name":"","type":"address"}]}]"#,
            )
            .unwrap(),
        );
        assert!(!abis.get(&AGENT).unwrap().is_empty());

        let script = EvmScript::from_entries(&[ScriptEntry::new(
            AGENT,
            wrap_execute(FEE_PROXY, commit_calldata()),
        )])
        .unwrap();

        let decoded = decode_script(&script, &abis).unwrap();
        let call = decoded[0].as_ref().unwrap();
        assert_eq!(call.agent, Some(AGENT));
        assert_eq!(call.target, FEE_PROXY);
        assert_eq!(call.function_name, "commit_new_fee");
        assert_eq!(call.arguments[1].display, "1000000");
    }

    #[test]
    fn test_direct_call() {
        let script =
            EvmScript::from_entries(&[ScriptEntry::new(FEE_PROXY, commit_calldata())]).unwrap();
        let decoded = decode_script(&script, &book()).unwrap();
        let call = decoded[0].as_ref().unwrap();
        assert_eq!(call.agent, None);
        assert_eq!(call.target, FEE_PROXY);
        assert_eq!(call.function_name, "commit_new_fee");
    }

    #[test]
    fn test_nested_execute_is_not_expanded() {
        let inner = wrap_execute(FEE_PROXY, commit_calldata());
        let outer = wrap_execute(AGENT, inner.to_vec());
        let script = EvmScript::from_entries(&[ScriptEntry::new(AGENT, outer)]).unwrap();

        let decoded = decode_script(&script, &book()).unwrap();
        let call = decoded[0].as_ref().unwrap();
        assert_eq!(call.agent, Some(AGENT));
        assert_eq!(call.target, AGENT);
        assert_eq!(call.function_name, "execute");
        assert_eq!(call.arguments[0].display, FEE_PROXY.to_checksum(None));
    }

    #[test]
    fn test_failures_are_per_entry() {
        let unknown = address!("0x9999999999999999999999999999999999999999");
        let script = EvmScript::from_entries(&[
            ScriptEntry::new(unknown, vec![0x01, 0x02, 0x03, 0x04]),
            ScriptEntry::new(FEE_PROXY, vec![0xde, 0xad, 0xbe, 0xef]),
            ScriptEntry::new(AGENT, wrap_execute(FEE_PROXY, commit_calldata())),
        ])
        .unwrap();

        let decoded = decode_script(&script, &book()).unwrap();
        assert_eq!(decoded.len(), 3);

        let first = decoded[0].as_ref().unwrap_err();
        assert_eq!(first.index, 0);
        assert_eq!(first.error, GovernanceError::AbiUnavailable(unknown));

        let second = decoded[1].as_ref().unwrap_err();
        assert!(matches!(second.error, GovernanceError::SelectorNotFound { .. }));

        assert!(decoded[2].is_ok());
    }

    #[test]
    fn test_truncated_arguments_use_placeholders() {
        let mut calldata = commit_calldata();
        calldata.truncate(40);
        let script = EvmScript::from_entries(&[ScriptEntry::new(FEE_PROXY, calldata)]).unwrap();
        let decoded = decode_script(&script, &book()).unwrap();
        let call = decoded[0].as_ref().unwrap();
        assert_eq!(call.arguments.len(), 3);
        assert!(call
            .arguments
            .iter()
            .all(|a| a.display == UNDECODED_PLACEHOLDER));
    }

    #[test]
    fn test_framing_error_aborts() {
        let mut bytes = EvmScript::from_entries(&[ScriptEntry::new(FEE_PROXY, commit_calldata())])
            .unwrap()
            .into_bytes()
            .to_vec();
        bytes.pop();
        assert!(matches!(
            decode_script(&EvmScript::from_bytes(bytes), &book()),
            Err(GovernanceError::MalformedScript(_))
        ));
    }

    struct StaticSource {
        abis: Vec<(Address, &'static str)>,
        calls: std::sync::Mutex<Vec<Address>>,
    }

    #[async_trait::async_trait]
    impl AbiSource for StaticSource {
        async fn fetch_abi(&self, address: Address) -> GovernanceResult<ContractAbi> {
            self.calls.lock().unwrap().push(address);
            self.abis
                .iter()
                .find(|(a, _)| *a == address)
                .map(|(_, json)| parse_contract_abi(json).unwrap())
                .ok_or(GovernanceError::AbiUnavailable(address))
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    #[tokio::test]
    async fn test_decode_with_source_fetches_inner_targets() {
        let source = StaticSource {
            abis: vec![(FEE_PROXY, FEE_ABI)],
            calls: Default::default(),
        };
        let script = EvmScript::from_entries(&[
            ScriptEntry::new(AGENT, wrap_execute(FEE_PROXY, commit_calldata())),
            ScriptEntry::new(AGENT, wrap_execute(FEE_PROXY, commit_calldata())),
        ])
        .unwrap();

        let mut abis = AbiBook::new();
        let decoded = decode_with_source(&script, &source, &mut abis).await.unwrap();

        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|d| d.is_ok()));
        // agent once in the first round, the inner target once in the second
        assert_eq!(*source.calls.lock().unwrap(), vec![AGENT, FEE_PROXY]);
    }
}
