use std::path::PathBuf;

use alloy_primitives::Address;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dao_votes::config::{self, vote::VoteConfig, Config};
use dao_votes::domain::abi::AbiBook;
use dao_votes::domain::governance::{
    evaluate, AbiSource, BlobStore, DaoRegistry, EvmScript, GovernanceClient, VoteType,
};
use dao_votes::infrastructure::abi::{
    CachedAbiSource, ChainedAbiSource, LocalAbiSource, SourcifyAbiSource,
};
use dao_votes::infrastructure::script::{decode_script, decode_with_source, encode_vote_script};
use dao_votes::infrastructure::{AlloyGovernanceClient, IpfsStore};
use dao_votes::render;
use dao_votes::store::AbiCache;

#[derive(Debug, Parser)]
#[command(
    name = "dao-votes",
    version,
    about = "Build, decode and check Curve DAO (Aragon) votes"
)]
struct Args {
    /// HTTP JSON-RPC endpoint (e.g. http://localhost:8545)
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// Default log level; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode the script of an on-chain vote
    Decode {
        #[arg(long)]
        vote_type: VoteType,
        #[arg(long)]
        vote_id: u64,
    },
    /// Decode a raw hex EVM script
    DecodeScript { script: String },
    /// Show support, quorum and outcome of a vote
    Status {
        #[arg(long)]
        vote_type: VoteType,
        #[arg(long)]
        vote_id: u64,
    },
    /// Compile a vote file and create the vote
    Create {
        #[arg(long)]
        config: PathBuf,
        /// Sender of the newVote transaction; must be unlocked on the node
        #[arg(long)]
        creator: Address,
        /// Print the script without pinning or submitting anything (still reads chain state)
        #[arg(long)]
        dry_run: bool,
    },
    /// Execute a passed vote
    Execute {
        #[arg(long)]
        vote_type: VoteType,
        #[arg(long)]
        vote_id: u64,
        #[arg(long)]
        sender: Address,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level);

    let config = config::load();
    let registry = config.registry();

    match args.command {
        Command::Decode { vote_type, vote_id } => {
            let client = connect(&args.rpc, &config)?;
            decode_vote(&client, &registry, &config, vote_type, vote_id).await
        }
        Command::DecodeScript { script } => {
            let script = EvmScript::from_hex(&script)?;
            let source = abi_source(&config)?;
            let mut abis = AbiBook::new();
            let entries = decode_with_source(&script, source.as_ref(), &mut abis).await?;
            print!("{}", render::render_entries(&entries));
            Ok(())
        }
        Command::Status { vote_type, vote_id } => {
            let client = connect(&args.rpc, &config)?;
            let target = registry.select(vote_type);
            let tally = client.vote_tally(target.voting, vote_id).await?;
            let outcome = evaluate(&tally, tally.thresholds_or(target.thresholds));
            print!("{}", render::render_outcome(vote_id, &tally, &outcome));
            Ok(())
        }
        Command::Create {
            config: vote_file,
            creator,
            dry_run,
        } => {
            let vote = VoteConfig::load(&vote_file)?;
            create_vote(&args.rpc, &config, &registry, &vote, creator, dry_run).await
        }
        Command::Execute {
            vote_type,
            vote_id,
            sender,
        } => {
            let client = connect(&args.rpc, &config)?;
            let target = registry.select(vote_type);
            if !client.can_execute(target.voting, vote_id).await? {
                bail!("vote {} on the {} DAO cannot be executed", vote_id, vote_type);
            }
            client.execute_vote(target.voting, vote_id, sender).await?;
            println!("Executed vote #{}", vote_id);
            Ok(())
        }
    }
}

fn init_tracing(level: tracing::Level) {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::from_level(level).into())
        .from_env_lossy();
    // Logs go to stderr so stdout stays pipeable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn connect(rpc: &Option<String>, config: &Config) -> Result<AlloyGovernanceClient> {
    let url = rpc
        .clone()
        .or_else(|| config.rpc.clone())
        .unwrap_or_else(|| config::DEFAULT_RPC.to_string());
    AlloyGovernanceClient::connect(&url).with_context(|| format!("connect to {}", url))
}

/// Local directories first, then Sourcify behind the persistent cache
fn abi_source(config: &Config) -> Result<Box<dyn AbiSource>> {
    let mut sources: Vec<Box<dyn AbiSource>> = Vec::new();

    let roots = config.abi_roots();
    if !roots.is_empty() {
        let local = LocalAbiSource::scan_roots(&roots);
        for err in &local.errors {
            tracing::warn!(error = %err, "skipped ABI file");
        }
        sources.push(Box::new(local));
    }

    if config.sourcify {
        let sourcify: Box<dyn AbiSource> = Box::new(SourcifyAbiSource::new(config.chain_id)?);
        let cache = config::abi_cache_path().map(|path| AbiCache::open(&path));
        match cache {
            Some(Ok(cache)) => sources.push(Box::new(CachedAbiSource::new(
                sourcify,
                cache,
                config.chain_id,
            ))),
            Some(Err(err)) => {
                tracing::warn!(error = %format!("{:#}", err), "ABI cache disabled");
                sources.push(sourcify);
            }
            None => sources.push(sourcify),
        }
    }

    if sources.is_empty() {
        bail!("no ABI source configured (set abi_paths or enable sourcify)");
    }
    Ok(Box::new(ChainedAbiSource::new(sources)))
}

fn ipfs_store(config: &Config) -> Result<IpfsStore> {
    IpfsStore::new(
        &config.ipfs.api_url,
        &config.ipfs.gateway_url,
        config.ipfs.credentials(),
        config.ipfs.timeout(),
    )
}

async fn decode_vote(
    client: &AlloyGovernanceClient,
    registry: &DaoRegistry,
    config: &Config,
    vote_type: VoteType,
    vote_id: u64,
) -> Result<()> {
    let target = registry.select(vote_type);
    let script = client.vote_script(target.voting, vote_id).await?;

    match client.vote_metadata(target.voting, vote_id).await {
        Ok(hash) => match ipfs_store(config)?.get(&hash).await {
            Ok(text) => println!("Description:\n{}\n", text),
            Err(err) => println!("Description unavailable: {}\n", err),
        },
        Err(err) => tracing::warn!(error = %err, "vote metadata lookup failed"),
    }

    let source = abi_source(config)?;
    let mut abis = AbiBook::new();
    let entries = decode_with_source(&script, source.as_ref(), &mut abis).await?;
    print!("{}", render::render_entries(&entries));
    Ok(())
}

async fn create_vote(
    rpc: &Option<String>,
    config: &Config,
    registry: &DaoRegistry,
    vote: &VoteConfig,
    creator: Address,
    dry_run: bool,
) -> Result<()> {
    let target = registry.select(vote.vote_type);
    // Compiling reads gauge, wallet and pool state, so even a dry run needs a node
    let client = connect(rpc, config)?;

    let source = abi_source(config)?;
    let mut abis = AbiBook::new();
    let actions = vote.compile(&client, source.as_ref(), &mut abis).await?;
    if actions.is_empty() {
        bail!("every action is already in effect on chain; nothing to vote on");
    }
    let script = encode_vote_script(target, &actions, &abis)?;

    println!("EVM script: {}\n", script);
    print!("{}", render::render_entries(&decode_script(&script, &abis)?));

    if dry_run {
        return Ok(());
    }

    if !client.can_create_vote(target.voting, creator).await? {
        bail!("{} cannot create votes on the {} DAO", creator, vote.vote_type);
    }

    let hash = ipfs_store(config)?.put(&vote.description).await?;
    let vote_id = client
        .submit_vote(target, &script, &format!("ipfs:{}", hash), creator)
        .await?;
    println!("\nCreated vote #{} on the {} DAO", vote_id, vote.vote_type);
    Ok(())
}
