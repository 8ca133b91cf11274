//! Vote files: a description plus a list of actions, compiled to `Action`s
//!
//! ```toml
//! vote_type = "ownership"
//! description = "Kill the old gauge and whitelist a locker"
//!
//! [[actions]]
//! kind = "kill_gauge"
//! gauge = "0x..."            # admin resolved on chain unless given
//!
//! [[actions]]
//! kind = "stableswap_params"
//! pool = "0x..."
//! admin = "0x..."
//! amplification = 2000
//! fee = 4000000
//! admin_fee = 5000000000
//! min_asymmetry = 0          # must be set to lower amplification
//!
//! [[actions]]
//! kind = "call"
//! target = "0x..."
//! function = "commit_new_fee"
//! args = ["0x...", 4000000, 5000000000]
//! ```

use std::collections::HashSet;
use std::path::Path;

use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::Function;
use alloy_primitives::{Address, U256};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::domain::abi::AbiBook;
use crate::domain::governance::{AbiSource, Action, ChainReader, VoteType, SMARTWALLET_CHECKER};
use crate::infrastructure::abi::{function_signature, param_types, parse_arguments};
use crate::infrastructure::script::fetch_missing;

const APPROVE_WALLET: &str = "function approveWallet(address _wallet)";
const SET_KILLED: &str = "function set_killed(address _gauge, bool _is_killed)";
const COMMIT_NEW_PARAMETERS: &str = "function commit_new_parameters(address _pool, uint256 amplification, uint256 new_fee, uint256 new_admin_fee, uint256 min_asymmetry)";

#[derive(Debug, Clone, Deserialize)]
pub struct VoteConfig {
    #[serde(default = "default_vote_type")]
    pub vote_type: VoteType,
    pub description: String,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

fn default_vote_type() -> VoteType {
    VoteType::Ownership
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Arbitrary call; `function` is a name or a full signature
    Call {
        target: Address,
        function: String,
        #[serde(default)]
        args: Vec<toml::Value>,
    },
    /// Allow a contract to lock veCRV
    Whitelist { address: Address },
    /// Kill a gauge; without `admin` the gauge's admin is looked up on chain
    KillGauge {
        gauge: Address,
        #[serde(default)]
        admin: Option<Address>,
    },
    /// Commit new stableswap parameters through the pool's owner proxy
    StableswapParams {
        pool: Address,
        admin: Address,
        amplification: u64,
        fee: u64,
        admin_fee: u64,
        #[serde(default)]
        min_asymmetry: u64,
    },
}

impl VoteConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read vote file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parse vote file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.actions.is_empty() {
            bail!("vote has no actions");
        }
        Ok(config)
    }

    /// Contracts whose ABIs `compile` fetches for `call` actions
    pub fn call_targets(&self) -> Vec<Address> {
        let mut targets = Vec::new();
        for action in &self.actions {
            if let ActionSpec::Call { target, .. } = action {
                if !targets.contains(target) {
                    targets.push(*target);
                }
            }
        }
        targets
    }

    /// Resolve every action against fetched ABIs and current chain state
    ///
    /// Built-in actions register their function in `abis` so the encoder
    /// finds it even for contracts without a published ABI. Actions already
    /// in effect on chain (killed gauge, approved wallet) are dropped, so
    /// the result can be shorter than the file.
    pub async fn compile(
        &self,
        chain: &dyn ChainReader,
        source: &dyn AbiSource,
        abis: &mut AbiBook,
    ) -> Result<Vec<Action>> {
        let mut attempted = HashSet::new();
        fetch_missing(source, abis, &self.call_targets(), &mut attempted).await;

        let mut actions = Vec::new();
        let mut whitelisted: Vec<Address> = Vec::new();

        for (index, spec) in self.actions.iter().enumerate() {
            let action = match spec {
                ActionSpec::Call {
                    target,
                    function,
                    args,
                } => compile_call(*target, function, args, abis)
                    .map(Some)
                    .with_context(|| format!("action #{} ({})", index, function))?,
                ActionSpec::Whitelist { address } => {
                    if whitelisted.contains(address) {
                        tracing::debug!(%address, "duplicate whitelist entry dropped");
                        continue;
                    }
                    whitelisted.push(*address);
                    whitelist(chain, abis, *address)
                        .await
                        .with_context(|| format!("action #{} (whitelist {})", index, address))?
                }
                ActionSpec::KillGauge { gauge, admin } => {
                    kill_gauge(chain, source, abis, &mut attempted, *gauge, *admin)
                        .await
                        .with_context(|| format!("action #{} (kill_gauge {})", index, gauge))?
                }
                ActionSpec::StableswapParams {
                    pool,
                    admin,
                    amplification,
                    fee,
                    admin_fee,
                    min_asymmetry,
                } => pool_params(
                    chain,
                    abis,
                    *pool,
                    *admin,
                    [*amplification, *fee, *admin_fee, *min_asymmetry],
                )
                .await
                .map(Some)
                .with_context(|| format!("action #{} (stableswap_params {})", index, pool))?,
            };
            actions.extend(action);
        }
        Ok(actions)
    }
}

async fn whitelist(
    chain: &dyn ChainReader,
    abis: &mut AbiBook,
    wallet: Address,
) -> Result<Option<Action>> {
    if chain.wallet_approved(SMARTWALLET_CHECKER, wallet).await? {
        tracing::info!(%wallet, "wallet already approved, skipping");
        return Ok(None);
    }
    register_builtin(abis, SMARTWALLET_CHECKER, APPROVE_WALLET)?;
    Ok(Some(Action::new(
        SMARTWALLET_CHECKER,
        "approveWallet",
        vec![DynSolValue::Address(wallet)],
    )))
}

async fn kill_gauge(
    chain: &dyn ChainReader,
    source: &dyn AbiSource,
    abis: &mut AbiBook,
    attempted: &mut HashSet<Address>,
    gauge: Address,
    admin: Option<Address>,
) -> Result<Option<Action>> {
    if chain.gauge_is_killed(gauge).await? {
        tracing::info!(%gauge, "gauge already killed, skipping");
        return Ok(None);
    }

    let admin = match admin {
        Some(admin) => admin,
        None => {
            let admin = chain
                .gauge_admin(gauge)
                .await?
                .ok_or_else(|| anyhow!("gauge has no factory, admin or owner"))?;
            fetch_missing(source, abis, &[admin], attempted).await;
            let killable = abis
                .get(&admin)
                .is_some_and(|abi| !abi.resolve_by_name("set_killed").is_empty());
            if !killable {
                bail!("gauge cannot be killed: admin {} has no set_killed", admin);
            }
            admin
        }
    };

    register_builtin(abis, admin, SET_KILLED)?;
    Ok(Some(Action::new(
        admin,
        "set_killed(address,bool)",
        vec![DynSolValue::Address(gauge), DynSolValue::Bool(true)],
    )))
}

/// `values` is amplification, fee, admin fee, min asymmetry
async fn pool_params(
    chain: &dyn ChainReader,
    abis: &mut AbiBook,
    pool: Address,
    admin: Address,
    values: [u64; 4],
) -> Result<Action> {
    let [amplification, _, _, min_asymmetry] = values;
    let current = chain.pool_amplification(pool).await?;
    if current > U256::from(amplification) && min_asymmetry == 0 {
        bail!(
            "cannot lower amplification from {} to {} without min_asymmetry",
            current,
            amplification
        );
    }

    register_builtin(abis, admin, COMMIT_NEW_PARAMETERS)?;
    let mut args = vec![DynSolValue::Address(pool)];
    args.extend(values.iter().map(|v| DynSolValue::Uint(U256::from(*v), 256)));
    Ok(Action::new(
        admin,
        "commit_new_parameters(address,uint256,uint256,uint256,uint256)",
        args,
    ))
}

fn register_builtin(abis: &mut AbiBook, address: Address, declaration: &str) -> Result<()> {
    let function = Function::parse(declaration)
        .map_err(|e| anyhow!("invalid built-in declaration '{}': {}", declaration, e))?;
    abis.abi_mut(address).insert(function_signature(&function));
    Ok(())
}

fn compile_call(
    target: Address,
    function: &str,
    args: &[toml::Value],
    abis: &AbiBook,
) -> Result<Action> {
    let abi = abis
        .get(&target)
        .ok_or_else(|| anyhow!("no ABI for {}", target))?;
    let candidates = abi.resolve_by_name(function);
    if candidates.is_empty() {
        bail!("function not found on {}", target);
    }

    let args = args.iter().map(toml_to_arg).collect::<Result<Vec<_>>>()?;

    // First overload whose parameters accept the arguments wins
    let mut last_err = None;
    for candidate in &candidates {
        let types = param_types(candidate)?;
        match parse_arguments(&types, &args) {
            Ok(values) => return Ok(Action::new(target, candidate.signature.clone(), values)),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("no overload accepts the arguments")))
}

/// Render a TOML value in the textual argument syntax
fn toml_to_arg(value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Array(items) => {
            let items = items.iter().map(toml_to_arg).collect::<Result<Vec<_>>>()?;
            Ok(format!("[{}]", items.join(",")))
        }
        other => bail!(
            "unsupported argument {} (use a string for large or fractional numbers)",
            other
        ),
    }
}
