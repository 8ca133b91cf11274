//! Persistent cache for fetched contract ABIs

use std::path::Path;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::abi::{ContractAbi, FunctionSignature};

/// SQLite-backed ABI cache keyed by (chain id, address)
#[derive(Debug)]
pub struct AbiCache {
    conn: Connection,
}

impl AbiCache {
    /// Open or create the cache database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        let conn = Connection::open(path).with_context(|| format!("open db {}", path.display()))?;
        let cache = Self { conn };
        cache.init()?;
        Ok(cache)
    }

    pub fn open_in_memory() -> Result<Self> {
        let cache = Self {
            conn: Connection::open_in_memory()?,
        };
        cache.init()?;
        Ok(cache)
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS abis (
                chain_id       INTEGER NOT NULL,
                address        TEXT NOT NULL,
                contract_name  TEXT,
                functions_json TEXT NOT NULL,
                created_at     INTEGER DEFAULT (strftime('%s', 'now')),
                PRIMARY KEY (chain_id, address)
            );

            CREATE INDEX IF NOT EXISTS idx_abis_created ON abis(created_at);
            ",
        )?;
        Ok(())
    }

    /// Save a fetched contract ABI
    pub fn save_abi(&self, chain_id: u64, address: Address, abi: &ContractAbi) -> Result<()> {
        let functions: Vec<&FunctionSignature> = abi.functions().collect();
        let functions_json = serde_json::to_string(&functions)?;
        self.conn.execute(
            "INSERT INTO abis(chain_id, address, contract_name, functions_json) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(chain_id, address) DO UPDATE SET
                contract_name=excluded.contract_name,
                functions_json=excluded.functions_json",
            params![chain_id, address_key(address), abi.contract_name, functions_json],
        )?;
        Ok(())
    }

    /// Get a cached contract ABI
    pub fn get_abi(&self, chain_id: u64, address: Address) -> Result<Option<ContractAbi>> {
        let row: Option<(Option<String>, String)> = self
            .conn
            .query_row(
                "SELECT contract_name, functions_json FROM abis
                 WHERE chain_id = ?1 AND address = ?2",
                params![chain_id, address_key(address)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((contract_name, functions_json)) = row else {
            return Ok(None);
        };
        let functions: Vec<FunctionSignature> =
            serde_json::from_str(&functions_json).context("corrupt cached ABI")?;

        let mut abi = ContractAbi::new();
        abi.contract_name = contract_name;
        for function in functions {
            abi.insert(function);
        }
        Ok(Some(abi))
    }

    /// Number of cached contracts
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM abis", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Drop entries older than `max_age_days`
    pub fn cleanup_old_entries(&self, max_age_days: u32) -> Result<usize> {
        let cutoff = max_age_days as i64 * 24 * 60 * 60;
        let deleted = self.conn.execute(
            "DELETE FROM abis WHERE created_at < (strftime('%s', 'now') - ?1)",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

fn address_key(address: Address) -> String {
    format!("0x{}", hex::encode(address))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::ParamSpec;
    use alloy_primitives::address;

    fn sample_abi() -> ContractAbi {
        let mut abi = ContractAbi::new();
        abi.contract_name = Some("LiquidityGauge".to_string());
        abi.insert(FunctionSignature {
            selector: [0x90, 0xb2, 0x29, 0x97],
            name: "set_killed".to_string(),
            signature: "set_killed(bool)".to_string(),
            inputs: vec![ParamSpec {
                name: "_is_killed".to_string(),
                kind: "bool".to_string(),
            }],
        });
        abi
    }

    #[test]
    fn test_abi_cache() {
        let cache = AbiCache::open_in_memory().unwrap();
        let gauge = address!("0x1111111111111111111111111111111111111111");

        cache.save_abi(1, gauge, &sample_abi()).unwrap();

        let abi = cache.get_abi(1, gauge).unwrap().unwrap();
        assert_eq!(abi.contract_name.as_deref(), Some("LiquidityGauge"));
        assert_eq!(abi.resolve_by_selector([0x90, 0xb2, 0x29, 0x97]).unwrap().name, "set_killed");

        // keyed by chain as well
        assert!(cache.get_abi(10, gauge).unwrap().is_none());
        assert_eq!(cache.count().unwrap(), 1);
    }

    #[test]
    fn test_save_overwrites() {
        let cache = AbiCache::open_in_memory().unwrap();
        let gauge = address!("0x1111111111111111111111111111111111111111");

        cache.save_abi(1, gauge, &ContractAbi::new()).unwrap();
        cache.save_abi(1, gauge, &sample_abi()).unwrap();

        assert_eq!(cache.get_abi(1, gauge).unwrap().unwrap().len(), 1);
        assert_eq!(cache.count().unwrap(), 1);
    }
}
