//! A single call the agent executes on behalf of the DAO

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;

/// One function call of a vote, in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Contract the agent calls
    pub target: Address,
    /// Bare function name, or a full signature to pick an overload
    pub function: String,
    /// Positional ABI-typed arguments
    pub args: Vec<DynSolValue>,
}

impl Action {
    pub fn new(target: Address, function: impl Into<String>, args: Vec<DynSolValue>) -> Self {
        Self {
            target,
            function: function.into(),
            args,
        }
    }
}
