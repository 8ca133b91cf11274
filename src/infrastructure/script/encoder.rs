//! EVM script encoder
//!
//! Every action becomes one script entry addressed to the agent, whose
//! calldata is `execute(action.target, 0, innerCalldata)`. Entry order is
//! execution order.

use crate::domain::abi::AbiBook;
use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::{Action, EvmScript, GovernanceTarget, ScriptEntry};
use crate::infrastructure::abi::{check_values, encode_call, param_types, select_overload};

use super::agent::wrap_execute;

/// Build the vote script for `actions`; any failing action aborts the whole script
pub fn encode_vote_script(
    target: &GovernanceTarget,
    actions: &[Action],
    abis: &AbiBook,
) -> GovernanceResult<EvmScript> {
    tracing::info!(agent = %target.agent, voting = %target.voting, actions = actions.len(), "encoding vote script");

    let entries = actions
        .iter()
        .enumerate()
        .map(|(index, action)| {
            let inner = encode_action(index, action, abis)?;
            Ok(ScriptEntry::new(target.agent, wrap_execute(action.target, inner)))
        })
        .collect::<GovernanceResult<Vec<_>>>()?;

    EvmScript::from_entries(&entries)
}

/// ABI-encode the inner call of one action against its target's ABI
pub fn encode_action(index: usize, action: &Action, abis: &AbiBook) -> GovernanceResult<Vec<u8>> {
    let unresolved = || GovernanceError::UnresolvedFunction {
        index,
        address: action.target,
        function: action.function.clone(),
    };

    // No ABI for the target resolves nothing, same as a missing function
    let abi = abis.get(&action.target).ok_or_else(unresolved)?;
    let candidates = abi.resolve_by_name(&action.function);
    if candidates.is_empty() {
        return Err(unresolved());
    }

    let encoding_error = |reason: String| GovernanceError::Encoding {
        index,
        function: action.function.clone(),
        reason,
    };

    let function = match select_overload(&candidates, &action.args) {
        Some(function) => function,
        // Single candidate: report why the arguments do not fit it
        None if candidates.len() == 1 => {
            let types = param_types(candidates[0]).map_err(|e| encoding_error(format!("{:#}", e)))?;
            let reason = check_values(&types, &action.args)
                .err()
                .map(|e| format!("{:#}", e))
                .unwrap_or_else(|| "arguments do not match signature".to_string());
            return Err(encoding_error(reason));
        }
        None => {
            let signatures: Vec<&str> = candidates.iter().map(|f| f.signature.as_str()).collect();
            return Err(encoding_error(format!(
                "arguments match none of the overloads {}",
                signatures.join(", ")
            )));
        }
    };

    tracing::debug!(index, target = %action.target, signature = %function.signature, "encoding action");
    encode_call(function, &action.args).map_err(|e| encoding_error(format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::governance::{DaoRegistry, VoteType};
    use crate::infrastructure::abi::parse_contract_abi;
    use crate::infrastructure::script::agent::EXECUTE_SELECTOR;
    use alloy_dyn_abi::DynSolValue;
    use alloy_primitives::{address, Address};

    const GAUGE_ABI: &str = r#"[
        {"type":"function","name":"set_killed","stateMutability":"nonpayable",
         "inputs":[{"name":"_is_killed","type":"bool"}],"outputs":[]}
    ]"#;

    const GAUGE: Address = address!("0x1111111111111111111111111111111111111111");

    fn book() -> AbiBook {
        let mut abis = AbiBook::new();
        abis.insert(GAUGE, parse_contract_abi(GAUGE_ABI).unwrap());
        abis
    }

    #[test]
    fn test_single_action_layout() {
        let registry = DaoRegistry::curve_mainnet();
        let target = registry.select(VoteType::Ownership);
        let actions = vec![Action::new(GAUGE, "set_killed", vec![DynSolValue::Bool(true)])];

        let script = encode_vote_script(target, &actions, &book()).unwrap();
        let entries = script.parse().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, target.agent);
        assert_eq!(entries[0].selector(), Some(EXECUTE_SELECTOR));
        // execute head (3 words) + bytes length word + padded inner call (4 + 32 bytes)
        assert_eq!(entries[0].calldata.len(), 4 + 32 * 4 + 64);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let registry = DaoRegistry::curve_mainnet();
        let target = registry.select(VoteType::Parameter);
        let actions = vec![
            Action::new(GAUGE, "set_killed", vec![DynSolValue::Bool(true)]),
            Action::new(GAUGE, "set_killed", vec![DynSolValue::Bool(false)]),
        ];
        let first = encode_vote_script(target, &actions, &book()).unwrap();
        let second = encode_vote_script(target, &actions, &book()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_function() {
        let registry = DaoRegistry::curve_mainnet();
        let actions = vec![
            Action::new(GAUGE, "set_killed", vec![DynSolValue::Bool(true)]),
            Action::new(GAUGE, "kill_me", vec![]),
        ];
        let err = encode_vote_script(registry.select(VoteType::Ownership), &actions, &book())
            .unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::UnresolvedFunction { index: 1, ref function, .. } if function == "kill_me"
        ));
    }

    #[test]
    fn test_bad_arguments() {
        let registry = DaoRegistry::curve_mainnet();
        let actions = vec![Action::new(GAUGE, "set_killed", vec![])];
        let err = encode_vote_script(registry.select(VoteType::Ownership), &actions, &book())
            .unwrap_err();
        match err {
            GovernanceError::Encoding { index, reason, .. } => {
                assert_eq!(index, 0);
                assert!(reason.contains("Argument count mismatch"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_abi_names_the_action() {
        let registry = DaoRegistry::curve_mainnet();
        let unknown = address!("0x2222222222222222222222222222222222222222");
        let actions = vec![
            Action::new(GAUGE, "set_killed", vec![DynSolValue::Bool(true)]),
            Action::new(unknown, "set_killed", vec![]),
        ];
        let err = encode_vote_script(registry.select(VoteType::Ownership), &actions, &book())
            .unwrap_err();
        assert_eq!(
            err,
            GovernanceError::UnresolvedFunction {
                index: 1,
                address: unknown,
                function: "set_killed".to_string(),
            }
        );
        let message = err.to_string();
        assert!(message.contains("#1"));
        assert!(message.contains("set_killed"));
    }
}
