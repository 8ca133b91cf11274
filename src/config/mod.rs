use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::governance::{DaoRegistry, TargetOverride, VoteType};
use crate::infrastructure::ipfs::{IpfsCredentials, DEFAULT_API_URL, DEFAULT_GATEWAY_URL};

pub mod vote;

pub const DEFAULT_RPC: &str = "http://localhost:8545";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    pub api_url: String,
    pub gateway_url: String,
    pub project_id: Option<String>,
    pub project_secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            project_id: None,
            project_secret: None,
            timeout_secs: 5,
        }
    }
}

impl IpfsConfig {
    /// Credentials from the file, else from `IPFS_PROJECT_ID` / `IPFS_PROJECT_SECRET`
    pub fn credentials(&self) -> Option<IpfsCredentials> {
        let project_id = self
            .project_id
            .clone()
            .or_else(|| std::env::var("IPFS_PROJECT_ID").ok())?;
        let project_secret = self
            .project_secret
            .clone()
            .or_else(|| std::env::var("IPFS_PROJECT_SECRET").ok())?;
        Some(IpfsCredentials {
            project_id,
            project_secret,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rpc: Option<String>,
    pub chain_id: u64,
    pub abi_paths: Vec<String>,
    pub sourcify: bool,
    pub ipfs: IpfsConfig,
    pub targets: BTreeMap<VoteType, TargetOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: None,
            chain_id: 1,
            abi_paths: Vec::new(),
            sourcify: true,
            ipfs: IpfsConfig::default(),
            targets: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Governance targets with this file's overrides applied
    pub fn registry(&self) -> DaoRegistry {
        DaoRegistry::curve_mainnet().with_overrides(&self.targets)
    }

    /// ABI directories with `~` expanded
    pub fn abi_roots(&self) -> Vec<PathBuf> {
        self.abi_paths.iter().map(|p| expand_home(p)).collect()
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("DAO_VOTES_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("dao-votes").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("dao-votes").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "dao-votes", "dao-votes")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("dao-votes"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("dao-votes"));
    }
    directories::ProjectDirs::from("io", "dao-votes", "dao-votes")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn abi_cache_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("abis.sqlite3"))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::governance::Thresholds;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.chain_id, 1);
        assert!(config.sourcify);
        assert_eq!(config.ipfs.api_url, DEFAULT_API_URL);
        assert_eq!(config.ipfs.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_full() {
        let config: Config = toml::from_str(
            r#"
            rpc = "http://localhost:8545"
            chain_id = 1
            abi_paths = ["./abis"]
            sourcify = false

            [ipfs]
            gateway_url = "https://gateway.example"
            timeout_secs = 10

            [targets.emergency]
            quorum = 40
            support = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc.as_deref(), Some("http://localhost:8545"));
        assert!(!config.sourcify);
        assert_eq!(config.ipfs.gateway_url, "https://gateway.example");
        assert_eq!(config.ipfs.api_url, DEFAULT_API_URL);

        let registry = config.registry();
        let emergency = registry.select(VoteType::Emergency);
        assert_eq!(emergency.quorum_percent, 40);
        assert_eq!(emergency.thresholds, Thresholds::from_percent(60, 40));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }
}
