//! Persistent local storage

mod abi_cache;

pub use abi_cache::AbiCache;
