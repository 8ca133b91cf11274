//! Reads a historical Curve vote from a mainnet node
//!
//! Needs `RPC_URL` pointing at an archive-capable mainnet endpoint.

use dao_votes::domain::abi::AbiBook;
use dao_votes::domain::governance::{evaluate, DaoRegistry, GovernanceClient, VoteType};
use dao_votes::infrastructure::abi::SourcifyAbiSource;
use dao_votes::infrastructure::script::decode_with_source;
use dao_votes::infrastructure::AlloyGovernanceClient;
use dao_votes::GovernanceError;

fn rpc_url() -> String {
    std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string())
}

#[tokio::test]
#[ignore = "requires a mainnet RPC endpoint"]
async fn test_read_and_decode_ownership_vote() {
    let client = AlloyGovernanceClient::connect(&rpc_url()).expect("valid url");
    let registry = DaoRegistry::curve_mainnet();
    let target = registry.select(VoteType::Ownership);

    let tally = client.vote_tally(target.voting, 1).await.expect("vote exists");
    assert!(!tally.open);
    let outcome = evaluate(&tally, tally.thresholds_or(target.thresholds));
    println!("vote 1: {}", outcome.category);

    let script = client.vote_script(target.voting, 1).await.expect("script");
    let source = SourcifyAbiSource::new(1).expect("http client");
    let mut abis = AbiBook::new();
    let entries = decode_with_source(&script, &source, &mut abis)
        .await
        .expect("well-formed script");
    assert!(!entries.is_empty());
}

#[tokio::test]
#[ignore = "requires a mainnet RPC endpoint"]
async fn test_unknown_vote_id() {
    let client = AlloyGovernanceClient::connect(&rpc_url()).expect("valid url");
    let voting = DaoRegistry::curve_mainnet()
        .select(VoteType::Ownership)
        .voting;

    let err = client.vote_tally(voting, u32::MAX as u64).await.unwrap_err();
    assert_eq!(
        err,
        GovernanceError::VoteNotFound {
            voting,
            vote_id: u32::MAX as u64
        }
    );
}
