//! Aragon EVM script codec

pub mod agent;
mod decoder;
mod encoder;

pub use agent::{wrap_execute, EXECUTE_SELECTOR};
pub use decoder::{
    decode_entries, decode_script, decode_with_source, fetch_missing, CallShape, MAX_FORWARD_DEPTH,
};
pub use encoder::{encode_action, encode_vote_script};
