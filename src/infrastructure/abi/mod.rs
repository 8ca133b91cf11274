//! ABI infrastructure - selectors, argument codec and ABI sources

mod args;
mod cached;
mod codec;
mod local;
mod selector;
mod sourcify;

pub use args::{parse_arguments, parse_value};
pub use cached::{CachedAbiSource, ChainedAbiSource};
pub use codec::{
    check_values, decode_args, decode_values, encode_call, humanize, humanize_bytes,
    humanize_hash, humanize_str, param_types, parse_hex_address, select_overload,
};
pub use local::LocalAbiSource;
pub use selector::{
    canonical_signature, canonical_type, compute_selector, contract_abi, function_signature,
    parse_contract_abi, resolve_function,
};
pub use sourcify::{SourcifyAbiSource, SOURCIFY_URL};
