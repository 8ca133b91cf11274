//! Plain-text rendering of decoded scripts and vote outcomes

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::domain::abi::{DecodeFailure, DecodedArg, DecodedCall, DecodedEntry};
use crate::domain::governance::{weight_to_f64, VoteOutcome, VoteTally};

/// Render every entry of a decoded script, one block per entry
pub fn render_entries(entries: &[DecodedEntry]) -> String {
    let blocks: Vec<String> = entries
        .iter()
        .map(|entry| match entry {
            Ok(call) => render_call(call),
            Err(failure) => render_failure(failure),
        })
        .collect();
    blocks.join("\n")
}

pub fn render_call(call: &DecodedCall) -> String {
    let mut out = String::new();
    match call.agent {
        Some(agent) => {
            let _ = writeln!(out, "Call via agent: {}", agent.to_checksum(None));
        }
        None => out.push_str("Direct call\n"),
    }
    let _ = writeln!(out, " ├─ To: {}", call.target.to_checksum(None));
    let _ = writeln!(out, " ├─ Function: {}", call.function_name);
    if call.arguments.is_empty() {
        out.push_str(" └─ Inputs: none\n");
    } else {
        out.push_str(" └─ Inputs:\n");
        out.push_str(&render_arguments(&call.arguments));
    }
    out
}

fn render_arguments(arguments: &[DecodedArg]) -> String {
    let mut out = String::new();
    let last = arguments.len().saturating_sub(1);
    for (idx, arg) in arguments.iter().enumerate() {
        let branch = if idx == last { "└─" } else { "├─" };
        let _ = writeln!(out, "    {} {}: {}", branch, arg.name, arg.display);
    }
    out
}

pub fn render_failure(failure: &DecodeFailure) -> String {
    format!(
        "Entry #{} could not be decoded\n ├─ To: {}\n └─ Reason: {}\n",
        failure.index,
        failure.target.to_checksum(None),
        failure.error
    )
}

/// Render an evaluated vote
pub fn render_outcome(vote_id: u64, tally: &VoteTally, outcome: &VoteOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Vote #{}: {}", vote_id, outcome.category);
    let _ = writeln!(out, " ├─ Start: {}", format_timestamp(outcome.start));
    let _ = writeln!(out, " ├─ End: {}", format_timestamp(outcome.end));
    let _ = writeln!(out, " ├─ Votes for: {:.2}", weight_to_f64(tally.yea));
    let _ = writeln!(out, " ├─ Votes against: {:.2}", weight_to_f64(tally.nay));
    let _ = writeln!(
        out,
        " ├─ Support: {:.2}% (required {:.2}%)",
        outcome.support * 100.0,
        outcome.thresholds.support_ratio() * 100.0
    );
    let _ = writeln!(
        out,
        " ├─ Quorum: {:.2}% (required {:.2}%)",
        outcome.quorum * 100.0,
        outcome.thresholds.quorum_ratio() * 100.0
    );
    let _ = writeln!(out, " └─ Executed: {}", if outcome.executed { "yes" } else { "no" });
    out
}

fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::GovernanceError;
    use crate::domain::governance::{evaluate, Thresholds};
    use alloy_primitives::{address, U256};

    fn arg(name: &str, display: &str) -> DecodedArg {
        DecodedArg {
            name: name.to_string(),
            kind: "uint256".to_string(),
            raw: None,
            display: display.to_string(),
        }
    }

    #[test]
    fn test_render_forwarded_call() {
        let call = DecodedCall {
            agent: Some(address!("0x40907540d8a6C65c637785e8f8B742ae6b0b9968")),
            target: address!("0xeCb456EA5365865EbAb8a2661B0c503410e9B347"),
            function_name: "commit_new_fee".to_string(),
            signature: "commit_new_fee(address,uint256,uint256)".to_string(),
            arguments: vec![arg("new_fee", "1000000"), arg("new_admin_fee", "5000000000")],
        };
        let text = render_call(&call);
        assert!(text.starts_with("Call via agent: 0x40907540d8a6C65c637785e8f8B742ae6b0b9968\n"));
        assert!(text.contains(" ├─ Function: commit_new_fee\n"));
        assert!(text.contains("    ├─ new_fee: 1000000\n"));
        assert!(text.ends_with("    └─ new_admin_fee: 5000000000\n"));
    }

    #[test]
    fn test_render_failure() {
        let target = address!("0x9999999999999999999999999999999999999999");
        let text = render_entries(&[Err(DecodeFailure {
            index: 2,
            target,
            error: GovernanceError::AbiUnavailable(target),
        })]);
        assert!(text.starts_with("Entry #2 could not be decoded"));
        assert!(text.contains("Reason: ABI unavailable for"));
    }

    #[test]
    fn test_render_outcome() {
        let weight = |n: u64| U256::from(n) * U256::from(10u64).pow(U256::from(18));
        let tally = VoteTally {
            yea: weight(153),
            nay: weight(147),
            voting_power: weight(1000),
            open: false,
            executed: false,
            start_date: 0,
            snapshot_block: 0,
            recorded_thresholds: None,
        };
        let outcome = evaluate(&tally, Thresholds::from_percent(51, 30));
        let text = render_outcome(7, &tally, &outcome);
        assert!(text.starts_with("Vote #7: Vote Passed\n"));
        assert!(text.contains("Start: 1970-01-01 00:00:00 UTC"));
        assert!(text.contains("End: 1970-01-08 00:00:00 UTC"));
        assert!(text.contains("Votes for: 153.00"));
        assert!(text.contains("Support: 51.00% (required 51.00%)"));
        assert!(text.contains("Quorum: 30.00% (required 30.00%)"));
    }
}
