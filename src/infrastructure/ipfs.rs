//! IPFS-backed store for vote descriptions
//!
//! Descriptions are stored as a small JSON document `{"text": ...}`, the
//! format Curve's voting UI reads.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::BlobStore;

pub const DEFAULT_API_URL: &str = "https://ipfs.infura.io:5001";
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.io";

#[derive(Debug, Serialize, Deserialize)]
struct Description {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Basic-auth credentials for the pinning API
#[derive(Debug, Clone)]
pub struct IpfsCredentials {
    pub project_id: String,
    pub project_secret: String,
}

pub struct IpfsStore {
    http: reqwest::Client,
    api_url: String,
    gateway_url: String,
    credentials: Option<IpfsCredentials>,
}

impl IpfsStore {
    pub fn new(
        api_url: &str,
        gateway_url: &str,
        credentials: Option<IpfsCredentials>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn add_url(&self) -> String {
        format!("{}/api/v0/add", self.api_url)
    }

    fn gateway_url(&self, hash: &str) -> String {
        format!("{}/ipfs/{}", self.gateway_url, hash)
    }

    async fn upload(&self, text: &str) -> Result<String> {
        let body = serde_json::to_string(&Description {
            text: text.to_string(),
        })?;
        let form = reqwest::multipart::Form::new().text("file", body);

        let mut request = self.http.post(self.add_url()).multipart(form);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.project_id, Some(&creds.project_secret));
        }

        let response = request
            .send()
            .await
            .context("POST to IPFS failed")?
            .error_for_status()
            .context("IPFS add rejected")?;
        let added: AddResponse = response.json().await.context("Invalid IPFS add response")?;
        Ok(added.hash)
    }

    async fn download(&self, hash: &str) -> Result<String> {
        let response = self
            .http
            .get(self.gateway_url(hash))
            .send()
            .await
            .context("IPFS gateway request failed")?
            .error_for_status()
            .context("IPFS gateway returned an error")?;
        let description: Description = response
            .json()
            .await
            .context("Description is not a {\"text\": ...} document")?;
        Ok(description.text)
    }
}

#[async_trait::async_trait]
impl BlobStore for IpfsStore {
    async fn put(&self, text: &str) -> GovernanceResult<String> {
        let hash = self
            .upload(text)
            .await
            .map_err(|e| GovernanceError::BlobUnavailable {
                hash: String::new(),
                reason: format!("{:#}", e),
            })?;
        tracing::info!(%hash, "description pinned");
        Ok(hash)
    }

    async fn get(&self, hash: &str) -> GovernanceResult<String> {
        self.download(hash)
            .await
            .map_err(|e| GovernanceError::BlobUnavailable {
                hash: hash.to_string(),
                reason: format!("{:#}", e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let store = IpfsStore::new(
            "https://ipfs.infura.io:5001/",
            DEFAULT_GATEWAY_URL,
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(store.add_url(), "https://ipfs.infura.io:5001/api/v0/add");
        assert_eq!(store.gateway_url("QmHash"), "https://ipfs.io/ipfs/QmHash");
    }

    #[test]
    fn test_document_format() {
        let body = serde_json::to_string(&Description {
            text: "Kill gauge".to_string(),
        })
        .unwrap();
        assert_eq!(body, r#"{"text":"Kill gauge"}"#);

        let added: AddResponse =
            serde_json::from_str(r#"{"Name":"file","Hash":"QmXyz","Size":"30"}"#).unwrap();
        assert_eq!(added.hash, "QmXyz");
    }
}
