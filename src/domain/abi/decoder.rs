//! Decoded call types

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::Address;

use crate::domain::error::GovernanceError;

/// Rendering used when an argument set cannot be decoded
pub const UNDECODED_PLACEHOLDER: &str = "<?>";

/// A decoded function argument
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArg {
    /// Parameter name (or "arg{n}" if unnamed)
    pub name: String,
    /// Canonical Solidity type (e.g., "address", "uint256", "(uint256,address)")
    pub kind: String,
    /// Raw decoded value; `None` when the calldata did not fit the resolved ABI
    pub raw: Option<DynSolValue>,
    /// Human-readable rendering of the value
    pub display: String,
}

impl DecodedArg {
    /// Placeholder for an argument that could not be decoded
    pub fn undecoded(name: String, kind: String) -> Self {
        Self {
            name,
            kind,
            raw: None,
            display: UNDECODED_PLACEHOLDER.to_string(),
        }
    }
}

/// One call of a vote script, after unwrapping agent forwarding
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    /// Outer target when the call was forwarded through `execute`
    pub agent: Option<Address>,
    /// Contract the call is ultimately executed on
    pub target: Address,
    /// Function name
    pub function_name: String,
    /// Full canonical signature (e.g., "set_killed(address,bool)")
    pub signature: String,
    /// Decoded arguments in declaration order
    pub arguments: Vec<DecodedArg>,
}

impl DecodedCall {
    /// Whether the call was routed through an agent's `execute`
    pub fn is_forwarded(&self) -> bool {
        self.agent.is_some()
    }

    /// Argument lookup by name
    pub fn argument(&self, name: &str) -> Option<&DecodedArg> {
        self.arguments.iter().find(|arg| arg.name == name)
    }
}

/// A script entry that could not be decoded; the rest of the batch still is
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeFailure {
    /// Position of the entry in the script
    pub index: usize,
    /// Literal target of the entry
    pub target: Address,
    pub error: GovernanceError,
}

/// Decoding result for one script entry
pub type DecodedEntry = std::result::Result<DecodedCall, DecodeFailure>;
