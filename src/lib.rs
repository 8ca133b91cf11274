//! Encode, decode and evaluate Aragon DAO votes
//!
//! The pure codec lives in [`infrastructure::script`] and
//! [`infrastructure::abi`]; network access goes through the traits in
//! [`domain::governance`].

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod render;
pub mod store;

pub use domain::{GovernanceError, GovernanceResult};
