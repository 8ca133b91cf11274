//! Local ABI directories
//!
//! A file is bound to an address either by its name (`<address>.json`) or by
//! a top-level `address` field, as deployment artifacts carry.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use alloy_primitives::Address;
use walkdir::WalkDir;

use super::codec::parse_hex_address;
use super::selector::parse_contract_abi;
use crate::domain::abi::ContractAbi;
use crate::domain::error::{GovernanceError, GovernanceResult};
use crate::domain::governance::AbiSource;

const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// ABIs loaded from disk at construction
#[derive(Debug, Default)]
pub struct LocalAbiSource {
    abis: HashMap<Address, ContractAbi>,
    /// Files that failed to parse
    pub errors: Vec<String>,
    pub scanned_files: usize,
    pub scan_ms: u128,
}

impl LocalAbiSource {
    /// Scan every root directory
    pub fn scan_roots(roots: &[PathBuf]) -> Self {
        let started = Instant::now();
        let mut source = Self::default();
        for root in roots {
            source.scan(root);
        }
        source.scan_ms = started.elapsed().as_millis();
        tracing::debug!(
            contracts = source.abis.len(),
            files = source.scanned_files,
            errors = source.errors.len(),
            elapsed_ms = source.scan_ms as u64,
            "scanned local ABI directories"
        );
        source
    }

    fn scan(&mut self, root: &Path) {
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_ignored_dir(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.errors.push(err.to_string());
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match entry.metadata() {
                Ok(meta) if meta.len() > MAX_FILE_SIZE => continue,
                Ok(_) => {}
                Err(err) => {
                    self.errors.push(format!("{}: {}", path.display(), err));
                    continue;
                }
            }

            self.scanned_files += 1;
            if let Err(err) = self.load_file(path) {
                self.errors.push(format!("{}: {:#}", path.display(), err));
            }
        }
    }

    fn load_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        let address = value
            .get("address")
            .and_then(|a| a.as_str())
            .and_then(parse_hex_address)
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(parse_hex_address)
            });
        // Not bound to a deployment; nothing to look up by
        let Some(address) = address else {
            return Ok(());
        };

        let abi = parse_contract_abi(&content)?;
        self.abis.insert(address, abi);
        Ok(())
    }

    pub fn insert(&mut self, address: Address, abi: ContractAbi) {
        self.abis.insert(address, abi);
    }

    pub fn len(&self) -> usize {
        self.abis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abis.is_empty()
    }
}

#[async_trait::async_trait]
impl AbiSource for LocalAbiSource {
    async fn fetch_abi(&self, address: Address) -> GovernanceResult<ContractAbi> {
        self.abis
            .get(&address)
            .cloned()
            .ok_or(GovernanceError::AbiUnavailable(address))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

fn is_ignored_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| matches!(name, ".git" | "target" | "node_modules" | "cache"))
        .unwrap_or(false)
}
