//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - ABI selectors, argument codec and ABI sources (local, Sourcify, cache)
//! - The Aragon EVM script encoder and decoder
//! - Alloy-based Aragon Voting client
//! - IPFS description store

pub mod abi;
pub mod ethereum;
pub mod ipfs;
pub mod script;

pub use ethereum::AlloyGovernanceClient;
pub use ipfs::IpfsStore;
