//! ABI domain models
//!
//! Function lookup tables and decoded-call types, independent of the
//! underlying codec implementation (alloy-dyn-abi).

mod decoder;
mod registry;

pub use decoder::{DecodeFailure, DecodedArg, DecodedCall, DecodedEntry, UNDECODED_PLACEHOLDER};
pub use registry::{AbiBook, ContractAbi, FunctionSignature, ParamSpec};
