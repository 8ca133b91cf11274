//! Governance domain: targets, actions, scripts and vote outcomes

mod action;
mod client;
mod outcome;
mod script;
mod target;

pub use action::Action;
pub use client::{AbiSource, BlobStore, ChainReader, GovernanceClient};
pub use outcome::{
    evaluate, weight_to_f64, OutcomeCategory, Thresholds, VoteOutcome, VoteTally, PCT_BASE,
    VOTE_TIME,
};
pub use script::{EvmScript, ScriptEntry, SPEC_ID};
pub use target::{DaoRegistry, GovernanceTarget, TargetOverride, VoteType, SMARTWALLET_CHECKER};
