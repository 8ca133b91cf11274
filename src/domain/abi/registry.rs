//! Contract ABI model - function lookup tables built once per fetched ABI

use std::collections::HashMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// A function parameter specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name (may be empty)
    pub name: String,
    /// Canonical Solidity type (e.g., "address", "uint256", "(uint256,address)[]")
    pub kind: String,
}

/// A function signature with its metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// 4-byte function selector
    pub selector: [u8; 4],
    /// Function name
    pub name: String,
    /// Canonical signature string (e.g., "transfer(address,uint256)")
    pub signature: String,
    /// Input parameters
    pub inputs: Vec<ParamSpec>,
}

impl FunctionSignature {
    /// Get selector as hex string
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }

    /// Parameter name at `idx`, or "arg{idx}" when the ABI leaves it unnamed
    pub fn arg_name(&self, idx: usize) -> String {
        match self.inputs.get(idx) {
            Some(param) if !param.name.trim().is_empty() => param.name.clone(),
            _ => format!("arg{}", idx),
        }
    }
}

/// Functions of a single contract, indexed by selector and by name
#[derive(Debug, Default, Clone)]
pub struct ContractAbi {
    /// Contract name when the ABI source knows it
    pub contract_name: Option<String>,
    /// Functions in declaration order
    functions: Vec<FunctionSignature>,
    /// Selector -> position in `functions`
    by_selector: HashMap<[u8; 4], usize>,
    /// Name -> positions of every overload, declaration order
    by_name: HashMap<String, Vec<usize>>,
}

impl ContractAbi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a function signature
    ///
    /// Note: First function for a given selector wins (no overwrite)
    pub fn insert(&mut self, function: FunctionSignature) {
        if self.by_selector.contains_key(&function.selector) {
            return;
        }
        let idx = self.functions.len();
        self.by_selector.insert(function.selector, idx);
        self.by_name
            .entry(function.name.clone())
            .or_default()
            .push(idx);
        self.functions.push(function);
    }

    /// Look up a function by selector
    pub fn resolve_by_selector(&self, selector: [u8; 4]) -> Option<&FunctionSignature> {
        self.by_selector
            .get(&selector)
            .map(|&idx| &self.functions[idx])
    }

    /// All overloads for a function name
    ///
    /// A full signature such as `commit(uint256,bool)` narrows the result to
    /// that exact overload.
    pub fn resolve_by_name(&self, name: &str) -> Vec<&FunctionSignature> {
        let name = name.trim();
        if name.contains('(') {
            let normalized = name.replace(' ', "");
            return self
                .functions
                .iter()
                .filter(|f| f.signature == normalized)
                .collect();
        }
        self.by_name
            .get(name)
            .map(|positions| positions.iter().map(|&idx| &self.functions[idx]).collect())
            .unwrap_or_default()
    }

    /// Get the number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the ABI has no functions
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Get all functions in declaration order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.iter()
    }
}

/// ABIs keyed by contract address, handed to the pure codec
#[derive(Debug, Default, Clone)]
pub struct AbiBook {
    abis: HashMap<Address, ContractAbi>,
}

impl AbiBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address, abi: ContractAbi) {
        self.abis.insert(address, abi);
    }

    pub fn get(&self, address: &Address) -> Option<&ContractAbi> {
        self.abis.get(address)
    }

    /// ABI of `address`, created empty if absent
    pub fn abi_mut(&mut self, address: Address) -> &mut ContractAbi {
        self.abis.entry(address).or_default()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.abis.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }
}
