//! Source composition: persistent caching and fallback chains

use std::sync::Mutex;

use alloy_primitives::Address;

use crate::domain::abi::ContractAbi;
use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::AbiSource;
use crate::store::AbiCache;

/// SQLite cache in front of another source
///
/// Only successful fetches are stored. Cache read/write failures are logged
/// and otherwise ignored.
pub struct CachedAbiSource {
    inner: Box<dyn AbiSource>,
    cache: Mutex<AbiCache>,
    chain_id: u64,
}

impl CachedAbiSource {
    pub fn new(inner: Box<dyn AbiSource>, cache: AbiCache, chain_id: u64) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
            chain_id,
        }
    }

    fn cached(&self, address: Address) -> Option<ContractAbi> {
        let cache = self.cache.lock().ok()?;
        match cache.get_abi(self.chain_id, address) {
            Ok(abi) => abi,
            Err(err) => {
                tracing::warn!(%address, error = %format!("{:#}", err), "ABI cache read failed");
                None
            }
        }
    }

    fn store(&self, address: Address, abi: &ContractAbi) {
        let Ok(cache) = self.cache.lock() else {
            return;
        };
        if let Err(err) = cache.save_abi(self.chain_id, address, abi) {
            tracing::warn!(%address, error = %format!("{:#}", err), "ABI cache write failed");
        }
    }
}

#[async_trait::async_trait]
impl AbiSource for CachedAbiSource {
    async fn fetch_abi(&self, address: Address) -> GovernanceResult<ContractAbi> {
        if let Some(abi) = self.cached(address) {
            tracing::debug!(%address, "ABI cache hit");
            return Ok(abi);
        }
        tracing::debug!(%address, source = self.inner.name(), "ABI cache miss");

        let abi = self.inner.fetch_abi(address).await?;
        self.store(address, &abi);
        Ok(abi)
    }

    fn name(&self) -> &'static str {
        "cache"
    }
}

/// Tries each source in order; the first success wins
pub struct ChainedAbiSource {
    sources: Vec<Box<dyn AbiSource>>,
}

impl ChainedAbiSource {
    pub fn new(sources: Vec<Box<dyn AbiSource>>) -> Self {
        Self { sources }
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait::async_trait]
impl AbiSource for ChainedAbiSource {
    async fn fetch_abi(&self, address: Address) -> GovernanceResult<ContractAbi> {
        for source in &self.sources {
            match source.fetch_abi(address).await {
                Ok(abi) => return Ok(abi),
                Err(err) => tracing::trace!(%address, source = source.name(), error = %err, "source missed"),
            }
        }
        Err(GovernanceError::AbiUnavailable(address))
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
