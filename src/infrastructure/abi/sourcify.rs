//! Remote ABI resolution via the Sourcify API

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::selector::contract_abi;
use crate::domain::abi::ContractAbi;
use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::AbiSource;

pub const SOURCIFY_URL: &str = "https://sourcify.dev/server";

#[derive(Debug, Deserialize)]
struct SourcifyResponse {
    #[serde(default)]
    abi: Option<alloy_json_abi::JsonAbi>,
    #[serde(default)]
    name: Option<String>,
}

/// Verified ABIs from Sourcify, with an in-memory cache of answers
pub struct SourcifyAbiSource {
    http: reqwest::Client,
    base_url: String,
    chain_id: u64,
    /// `None` remembers a definitive "not verified"
    cache: Arc<RwLock<HashMap<Address, Option<ContractAbi>>>>,
}

impl SourcifyAbiSource {
    pub fn new(chain_id: u64) -> Result<Self> {
        Self::with_base_url(chain_id, SOURCIFY_URL)
    }

    pub fn with_base_url(chain_id: u64, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chain_id,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn contract_url(&self, address: Address) -> String {
        format!(
            "{}/v2/contract/{}/{}?fields=abi,name",
            self.base_url,
            self.chain_id,
            address.to_checksum(None)
        )
    }

    async fn lookup(&self, address: Address) -> Result<Option<ContractAbi>> {
        let response = self
            .http
            .get(self.contract_url(address))
            .send()
            .await
            .context("Failed to query Sourcify")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .context("Sourcify returned an error")?;

        let data: SourcifyResponse = response
            .json()
            .await
            .context("Failed to parse Sourcify response")?;
        Ok(data.abi.map(|abi| contract_abi(&abi, data.name)))
    }
}

#[async_trait::async_trait]
impl AbiSource for SourcifyAbiSource {
    async fn fetch_abi(&self, address: Address) -> GovernanceResult<ContractAbi> {
        if let Some(cached) = self.cache.read().await.get(&address) {
            return cached.clone().ok_or(GovernanceError::AbiUnavailable(address));
        }

        match self.lookup(address).await {
            Ok(abi) => {
                tracing::debug!(%address, found = abi.is_some(), "sourcify lookup");
                // Transport failures are not cached so the next run retries
                self.cache.write().await.insert(address, abi.clone());
                abi.ok_or(GovernanceError::AbiUnavailable(address))
            }
            Err(err) => {
                tracing::warn!(%address, error = %format!("{:#}", err), "sourcify lookup failed");
                Err(GovernanceError::AbiUnavailable(address))
            }
        }
    }

    fn name(&self) -> &'static str {
        "sourcify"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_contract_url() {
        let source = SourcifyAbiSource::with_base_url(1, "https://example.org/server/").unwrap();
        let url = source.contract_url(address!("0xeCb456EA5365865EbAb8a2661B0c503410e9B347"));
        assert_eq!(
            url,
            "https://example.org/server/v2/contract/1/0xeCb456EA5365865EbAb8a2661B0c503410e9B347?fields=abi,name"
        );
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"name":"PoolProxy","abi":[{"type":"function","name":"commit_new_fee",
            "stateMutability":"nonpayable","inputs":[{"name":"_pool","type":"address"},
            {"name":"new_fee","type":"uint256"},{"name":"new_admin_fee","type":"uint256"}],
            "outputs":[]}]}"#;
        let data: SourcifyResponse = serde_json::from_str(body).unwrap();
        let abi = contract_abi(&data.abi.unwrap(), data.name);
        assert_eq!(abi.contract_name.as_deref(), Some("PoolProxy"));
        assert_eq!(abi.resolve_by_name("commit_new_fee").len(), 1);
    }
}
