//! Ethereum infrastructure - Alloy provider and Aragon Voting bindings

mod client;
mod voting;

pub use client::{create_provider, AlloyGovernanceClient, HttpFillProvider};
pub use voting::{
    new_vote_calldata, IForwarder, IGauge, IGaugeFactory, ISmartWalletChecker, IStableSwap, IVoting,
    NO_VOTE_REVERT,
};
