//! Function selector resolution
//!
//! Canonical signatures are rebuilt from the JSON ABI, descending into tuple
//! components, and hashed with keccak256 to index every function.

use alloy_json_abi::{Function, JsonAbi, Param};
use alloy_primitives::{keccak256, Address, Selector};
use anyhow::{Context, Result};

use crate::domain::abi::{ContractAbi, FunctionSignature, ParamSpec};
use crate::domain::error::{GovernanceError, GovernanceResult};

/// Canonical type of a parameter; tuples expand to `(component,...)` keeping array suffixes
pub fn canonical_type(param: &Param) -> String {
    match param.ty.strip_prefix("tuple") {
        Some(array_suffix) => {
            let components: Vec<String> = param.components.iter().map(canonical_type).collect();
            format!("({}){}", components.join(","), array_suffix)
        }
        None => param.ty.clone(),
    }
}

/// `name(type1,type2,...)` with no parameter names or whitespace
pub fn canonical_signature(function: &Function) -> String {
    let types: Vec<String> = function.inputs.iter().map(canonical_type).collect();
    format!("{}({})", function.name, types.join(","))
}

/// Compute the 4-byte function selector from a signature
pub fn compute_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build the lookup tables of a JSON ABI
pub fn function_signature(function: &Function) -> FunctionSignature {
    let signature = canonical_signature(function);
    FunctionSignature {
        selector: compute_selector(&signature),
        name: function.name.clone(),
        inputs: function
            .inputs
            .iter()
            .map(|input| ParamSpec {
                name: input.name.clone(),
                kind: canonical_type(input),
            })
            .collect(),
        signature,
    }
}

/// Parse a contract ABI from JSON
///
/// Accepts either a raw ABI array or an artifact object with an `abi` field.
pub fn parse_contract_abi(content: &str) -> Result<ContractAbi> {
    let value: serde_json::Value = serde_json::from_str(content).context("invalid ABI JSON")?;
    let contract_name = value
        .get("contractName")
        .or_else(|| value.get("name"))
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let abi_value = if value.is_array() {
        value
    } else if let Some(abi) = value.get("abi") {
        abi.clone()
    } else {
        anyhow::bail!("no ABI array found");
    };

    let abi: JsonAbi = serde_json::from_value(abi_value).context("invalid ABI entries")?;
    Ok(contract_abi(&abi, contract_name))
}

pub fn contract_abi(abi: &JsonAbi, contract_name: Option<String>) -> ContractAbi {
    let mut contract = ContractAbi::new();
    contract.contract_name = contract_name;
    // JsonAbi groups overloads by name; keep declaration order within a name
    for function in abi.functions() {
        contract.insert(function_signature(function));
    }
    contract
}

/// Find the function whose selector matches the first 4 bytes of calldata
pub fn resolve_function<'a>(
    abi: &'a ContractAbi,
    address: Address,
    selector: [u8; 4],
) -> GovernanceResult<&'a FunctionSignature> {
    abi.resolve_by_selector(selector)
        .ok_or(GovernanceError::SelectorNotFound {
            address,
            selector: Selector::from(selector),
        })
}
