//! Error taxonomy shared by the codec and the external collaborators

use alloy_primitives::{Address, Selector};
use thiserror::Error;

/// Errors produced while building, decoding or submitting governance votes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    /// No function in the contract ABI hashes to the calldata selector
    #[error("selector {selector} not found in ABI of {address}")]
    SelectorNotFound { address: Address, selector: Selector },

    /// An action names a function the target contract does not expose
    #[error("action #{index}: function `{function}` not found on {address}")]
    UnresolvedFunction {
        index: usize,
        address: Address,
        function: String,
    },

    /// Arguments do not fit the resolved function signature
    #[error("action #{index} ({function}): {reason}")]
    Encoding {
        index: usize,
        function: String,
        reason: String,
    },

    /// Script framing is broken; the cursor can no longer be trusted
    #[error("malformed EVM script: {0}")]
    MalformedScript(String),

    /// The contract is unverified or unknown to every ABI source
    #[error("ABI unavailable for {0}")]
    AbiUnavailable(Address),

    #[error("vote {vote_id} not found on {voting}")]
    VoteNotFound { voting: Address, vote_id: u64 },

    #[error("blob {hash} unavailable: {reason}")]
    BlobUnavailable { hash: String, reason: String },

    /// Transport or node failure in an external collaborator
    #[error("client error: {0}")]
    Client(String),
}

impl GovernanceError {
    /// Shorthand for a framing failure
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedScript(reason.into())
    }

    pub fn client(err: impl std::fmt::Display) -> Self {
        Self::Client(err.to_string())
    }
}

pub type GovernanceResult<T> = std::result::Result<T, GovernanceError>;
