//! Governance client over an Alloy HTTP provider
//!
//! Transactions are sent with `from` set and no local signer, so the node
//! must hold the sender unlocked (a fork node with impersonation, typically).

use alloy::network::Ethereum;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::{Filter, TransactionReceipt};
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};

use super::voting::{
    new_vote_calldata, IForwarder, IGauge, IGaugeFactory, ISmartWalletChecker, IStableSwap, IVoting,
    NO_VOTE_REVERT,
};
use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::{
    ChainReader, EvmScript, GovernanceClient, GovernanceTarget, ScriptEntry, Thresholds, VoteTally,
};

pub type HttpFillProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Create an HTTP provider with the recommended fillers
pub fn create_provider(url: &str) -> Result<HttpFillProvider> {
    let rpc_url = url.parse().context("Invalid HTTP URL")?;
    Ok(ProviderBuilder::new().connect_http(rpc_url))
}

pub struct AlloyGovernanceClient {
    provider: HttpFillProvider,
    endpoint: String,
}

impl AlloyGovernanceClient {
    pub fn connect(url: &str) -> Result<Self> {
        Ok(Self {
            provider: create_provider(url)?,
            endpoint: url.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn voting(&self, voting: Address) -> IVoting::IVotingInstance<&HttpFillProvider> {
        IVoting::new(voting, &self.provider)
    }
}

/// Map a contract call failure, recognizing the unknown-vote revert
fn call_error(voting: Address, vote_id: u64) -> impl Fn(alloy::contract::Error) -> GovernanceError {
    move |err| {
        let message = err.to_string();
        if message.contains(NO_VOTE_REVERT) {
            GovernanceError::VoteNotFound { voting, vote_id }
        } else {
            GovernanceError::Client(message)
        }
    }
}

fn vote_id_from_receipt(receipt: &TransactionReceipt) -> Option<u64> {
    receipt
        .inner
        .logs()
        .iter()
        .find_map(|log| log.log_decode::<IVoting::StartVote>().ok())
        .map(|log| log.inner.data.voteId.saturating_to::<u64>())
}

fn ensure_success(receipt: &TransactionReceipt, what: &str) -> GovernanceResult<()> {
    if receipt.status() {
        Ok(())
    } else {
        Err(GovernanceError::Client(format!(
            "{} transaction {} reverted",
            what, receipt.transaction_hash
        )))
    }
}

#[async_trait::async_trait]
impl GovernanceClient for AlloyGovernanceClient {
    async fn vote_script(&self, voting: Address, vote_id: u64) -> GovernanceResult<EvmScript> {
        let vote = self
            .voting(voting)
            .getVote(U256::from(vote_id))
            .call()
            .await
            .map_err(call_error(voting, vote_id))?;
        Ok(EvmScript::from(vote.script))
    }

    async fn vote_tally(&self, voting: Address, vote_id: u64) -> GovernanceResult<VoteTally> {
        let vote = self
            .voting(voting)
            .getVote(U256::from(vote_id))
            .call()
            .await
            .map_err(call_error(voting, vote_id))?;

        Ok(VoteTally {
            yea: vote.yea,
            nay: vote.nay,
            voting_power: vote.votingPower,
            open: vote.open,
            executed: vote.executed,
            start_date: vote.startDate,
            snapshot_block: vote.snapshotBlock,
            recorded_thresholds: Some(Thresholds {
                support_required: vote.supportRequired,
                min_accept_quorum: vote.minAcceptQuorum,
            }),
        })
    }

    async fn vote_metadata(&self, voting: Address, vote_id: u64) -> GovernanceResult<String> {
        let tally = self.vote_tally(voting, vote_id).await?;

        // The StartVote log lands one block after the snapshot
        let filter = Filter::new()
            .address(voting)
            .event_signature(IVoting::StartVote::SIGNATURE_HASH)
            .topic1(B256::from(U256::from(vote_id)))
            .from_block(tally.snapshot_block.saturating_sub(1))
            .to_block(tally.snapshot_block + 1);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(GovernanceError::client)?;

        let metadata = logs
            .iter()
            .find_map(|log| log.log_decode::<IVoting::StartVote>().ok())
            .map(|log| log.inner.data.metadata.clone())
            .ok_or_else(|| {
                GovernanceError::Client(format!("no StartVote log for vote {vote_id} on {voting}"))
            })?;

        Ok(metadata
            .strip_prefix("ipfs:")
            .unwrap_or(&metadata)
            .to_string())
    }

    async fn can_create_vote(&self, voting: Address, creator: Address) -> GovernanceResult<bool> {
        self.voting(voting)
            .canCreateNewVote(creator)
            .call()
            .await
            .map_err(GovernanceError::client)
    }

    async fn submit_vote(
        &self,
        target: &GovernanceTarget,
        script: &EvmScript,
        metadata: &str,
        creator: Address,
    ) -> GovernanceResult<u64> {
        let receipt = match target.forwarder {
            Some(forwarder) => {
                let calldata = new_vote_calldata(script.as_bytes().clone(), metadata);
                // The forwarder runs a one-entry script that calls newVote
                let wrapped = EvmScript::from_entries(&[ScriptEntry::new(target.voting, calldata)])?;
                tracing::info!(%forwarder, voting = %target.voting, %creator, "submitting vote via forwarder");
                IForwarder::new(forwarder, &self.provider)
                    .forward(wrapped.into_bytes())
                    .from(creator)
                    .send()
                    .await
                    .map_err(GovernanceError::client)?
                    .get_receipt()
                    .await
                    .map_err(GovernanceError::client)?
            }
            None => {
                tracing::info!(voting = %target.voting, %creator, "submitting vote");
                self.voting(target.voting)
                    .newVote(script.as_bytes().clone(), metadata.to_string(), false, false)
                    .from(creator)
                    .send()
                    .await
                    .map_err(GovernanceError::client)?
                    .get_receipt()
                    .await
                    .map_err(GovernanceError::client)?
            }
        };

        ensure_success(&receipt, "newVote")?;
        tracing::info!(tx = %receipt.transaction_hash, "vote transaction mined");

        vote_id_from_receipt(&receipt).ok_or_else(|| {
            GovernanceError::Client(format!(
                "no StartVote event in transaction {}",
                receipt.transaction_hash
            ))
        })
    }

    async fn can_execute(&self, voting: Address, vote_id: u64) -> GovernanceResult<bool> {
        self.voting(voting)
            .canExecute(U256::from(vote_id))
            .call()
            .await
            .map_err(call_error(voting, vote_id))
    }

    async fn execute_vote(
        &self,
        voting: Address,
        vote_id: u64,
        sender: Address,
    ) -> GovernanceResult<()> {
        tracing::info!(%voting, vote_id, %sender, "executing vote");
        let receipt = self
            .voting(voting)
            .executeVote(U256::from(vote_id))
            .from(sender)
            .send()
            .await
            .map_err(call_error(voting, vote_id))?
            .get_receipt()
            .await
            .map_err(GovernanceError::client)?;
        ensure_success(&receipt, "executeVote")
    }
}

#[async_trait::async_trait]
impl ChainReader for AlloyGovernanceClient {
    async fn gauge_is_killed(&self, gauge: Address) -> GovernanceResult<bool> {
        IGauge::new(gauge, &self.provider)
            .is_killed()
            .call()
            .await
            .map_err(GovernanceError::client)
    }

    async fn gauge_admin(&self, gauge: Address) -> GovernanceResult<Option<Address>> {
        let contract = IGauge::new(gauge, &self.provider);

        // A gauge without the view reverts; fall through to the next one
        if let Ok(factory) = contract.factory().call().await {
            let admin = IGaugeFactory::new(factory, &self.provider)
                .admin()
                .call()
                .await
                .map_err(GovernanceError::client)?;
            tracing::debug!(%gauge, %factory, %admin, "gauge admin from factory");
            return Ok(Some(admin));
        }
        if let Ok(admin) = contract.admin().call().await {
            tracing::debug!(%gauge, %admin, "gauge admin");
            return Ok(Some(admin));
        }
        if let Ok(owner) = contract.owner().call().await {
            tracing::debug!(%gauge, %owner, "gauge owner");
            return Ok(Some(owner));
        }
        Ok(None)
    }

    async fn wallet_approved(&self, checker: Address, wallet: Address) -> GovernanceResult<bool> {
        ISmartWalletChecker::new(checker, &self.provider)
            .check(wallet)
            .call()
            .await
            .map_err(GovernanceError::client)
    }

    async fn pool_amplification(&self, pool: Address) -> GovernanceResult<U256> {
        IStableSwap::new(pool, &self.provider)
            .A()
            .call()
            .await
            .map_err(GovernanceError::client)
    }
}
