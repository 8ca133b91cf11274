//! Capabilities consumed from the outside world
//!
//! The codec never performs I/O; these traits are the seams where ABIs,
//! vote state and descriptions come in.

use alloy_primitives::{Address, U256};

use super::outcome::VoteTally;
use super::script::EvmScript;
use super::target::GovernanceTarget;
use crate::domain::abi::ContractAbi;
use crate::domain::error::GovernanceResult;

/// Source of verified contract ABIs
#[async_trait::async_trait]
pub trait AbiSource: Send + Sync {
    /// Fetch the ABI of `address`; fails with `AbiUnavailable` if unknown
    async fn fetch_abi(&self, address: Address) -> GovernanceResult<ContractAbi>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Reads and creates votes on an Aragon voting app
#[async_trait::async_trait]
pub trait GovernanceClient: Send + Sync {
    /// Execution script stored on a vote; `VoteNotFound` if the id is unknown
    async fn vote_script(&self, voting: Address, vote_id: u64) -> GovernanceResult<EvmScript>;

    async fn vote_tally(&self, voting: Address, vote_id: u64) -> GovernanceResult<VoteTally>;

    /// Description hash from the vote metadata, `ipfs:` prefix removed
    async fn vote_metadata(&self, voting: Address, vote_id: u64) -> GovernanceResult<String>;

    async fn can_create_vote(&self, voting: Address, creator: Address) -> GovernanceResult<bool>;

    /// Create a vote; the caller must have checked `can_create_vote`
    async fn submit_vote(
        &self,
        target: &GovernanceTarget,
        script: &EvmScript,
        metadata: &str,
        creator: Address,
    ) -> GovernanceResult<u64>;

    async fn can_execute(&self, voting: Address, vote_id: u64) -> GovernanceResult<bool>;

    async fn execute_vote(
        &self,
        voting: Address,
        vote_id: u64,
        sender: Address,
    ) -> GovernanceResult<()>;
}

/// Contract state consulted while compiling a vote file
///
/// Built-in actions skip work that is already done on chain, so a vote
/// never carries a no-op or reverting call.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    async fn gauge_is_killed(&self, gauge: Address) -> GovernanceResult<bool>;

    /// Admin of a gauge: its factory's `admin()`, else `admin()`, else `owner()`
    async fn gauge_admin(&self, gauge: Address) -> GovernanceResult<Option<Address>>;

    /// `check(wallet)` on the smart wallet checker
    async fn wallet_approved(&self, checker: Address, wallet: Address) -> GovernanceResult<bool>;

    /// Current amplification coefficient `A()` of a stableswap pool
    async fn pool_amplification(&self, pool: Address) -> GovernanceResult<U256>;
}

/// Content-addressed text store for vote descriptions
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `text`, returning its content hash
    async fn put(&self, text: &str) -> GovernanceResult<String>;

    /// Fetch text by content hash; `BlobUnavailable` on failure or timeout
    async fn get(&self, hash: &str) -> GovernanceResult<String>;
}
