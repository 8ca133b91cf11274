//! Vote outcome evaluation from raw tallies
//!
//! Pass/fail is decided in Aragon fixed point (`PCT_BASE = 10^18`) with
//! integer arithmetic; the floating-point ratios are derived for display.

use std::fmt;

use alloy_primitives::U256;

/// Aragon percentage base: 100% == 10^18
pub const PCT_BASE: u64 = 1_000_000_000_000_000_000;

/// Voting period of the Curve DAO voting apps, seconds
pub const VOTE_TIME: u64 = 604_800;

/// Pass criteria of a vote, expressed in `PCT_BASE` units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub support_required: u64,
    pub min_accept_quorum: u64,
}

impl Thresholds {
    pub const fn percent(value: u8) -> u64 {
        value as u64 * (PCT_BASE / 100)
    }

    pub const fn from_percent(support: u8, quorum: u8) -> Self {
        Self {
            support_required: Self::percent(support),
            min_accept_quorum: Self::percent(quorum),
        }
    }

    pub fn support_ratio(&self) -> f64 {
        self.support_required as f64 / PCT_BASE as f64
    }

    pub fn quorum_ratio(&self) -> f64 {
        self.min_accept_quorum as f64 / PCT_BASE as f64
    }
}

/// Read-only snapshot of a vote as stored by the voting app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    pub yea: U256,
    pub nay: U256,
    pub voting_power: U256,
    pub open: bool,
    pub executed: bool,
    pub start_date: u64,
    pub snapshot_block: u64,
    /// Criteria recorded on the vote at creation, when the app exposes them
    pub recorded_thresholds: Option<Thresholds>,
}

impl VoteTally {
    pub fn total_votes(&self) -> U256 {
        self.yea.saturating_add(self.nay)
    }

    pub fn end_date(&self) -> u64 {
        self.start_date.saturating_add(VOTE_TIME)
    }

    /// Criteria recorded on the vote, else `fallback`
    pub fn thresholds_or(&self, fallback: Thresholds) -> Thresholds {
        self.recorded_thresholds.unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeCategory {
    Ongoing,
    InvalidNoVotes,
    Passed,
    FailedSupport,
    FailedQuorum,
    FailedBoth,
}

impl OutcomeCategory {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OutcomeCategory::FailedSupport
                | OutcomeCategory::FailedQuorum
                | OutcomeCategory::FailedBoth
        )
    }
}

impl fmt::Display for OutcomeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutcomeCategory::Ongoing => "Voting Ongoing",
            OutcomeCategory::InvalidNoVotes => "Vote Invalid: No Votes",
            OutcomeCategory::Passed => "Vote Passed",
            OutcomeCategory::FailedSupport => "Vote Failed: Support Not Met",
            OutcomeCategory::FailedQuorum => "Vote Failed: Quorum Not Met",
            OutcomeCategory::FailedBoth => "Vote Failed: Both Support and Quorum Not Met",
        };
        f.write_str(label)
    }
}

/// Derived status of a vote
#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// yea / (yea + nay)
    pub support: f64,
    /// (yea + nay) / voting power
    pub quorum: f64,
    pub category: OutcomeCategory,
    pub thresholds: Thresholds,
    pub start: u64,
    pub end: u64,
    pub executed: bool,
}

/// Evaluate a tally against pass criteria; thresholds are inclusive
pub fn evaluate(tally: &VoteTally, thresholds: Thresholds) -> VoteOutcome {
    let total_votes = tally.total_votes();
    let no_votes = total_votes.is_zero() || tally.voting_power.is_zero();

    let (support, quorum) = if no_votes {
        (0.0, 0.0)
    } else {
        (
            ratio(tally.yea, total_votes),
            ratio(total_votes, tally.voting_power),
        )
    };

    let category = if tally.open {
        OutcomeCategory::Ongoing
    } else if no_votes {
        OutcomeCategory::InvalidNoVotes
    } else {
        let support_met =
            meets_pct(tally.yea, total_votes, thresholds.support_required);
        let quorum_met =
            meets_pct(total_votes, tally.voting_power, thresholds.min_accept_quorum);
        match (support_met, quorum_met) {
            (true, true) => OutcomeCategory::Passed,
            (false, false) => OutcomeCategory::FailedBoth,
            (false, true) => OutcomeCategory::FailedSupport,
            (true, false) => OutcomeCategory::FailedQuorum,
        }
    };

    VoteOutcome {
        support,
        quorum,
        category,
        thresholds,
        start: tally.start_date,
        end: tally.end_date(),
        executed: tally.executed,
    }
}

/// `value / total >= pct / PCT_BASE`, without division
fn meets_pct(value: U256, total: U256, pct: u64) -> bool {
    value.saturating_mul(U256::from(PCT_BASE)) >= total.saturating_mul(U256::from(pct))
}

fn ratio(num: U256, den: U256) -> f64 {
    if den.is_zero() {
        return 0.0;
    }
    let scaled = num.saturating_mul(U256::from(PCT_BASE)) / den;
    scaled.saturating_to::<u128>() as f64 / PCT_BASE as f64
}

/// Token weight (18 decimals) as a float, for display
pub fn weight_to_f64(weight: U256) -> f64 {
    let base = U256::from(PCT_BASE);
    let whole: f64 = (weight / base).to_string().parse().unwrap_or(0.0);
    let frac: f64 = (weight % base).to_string().parse().unwrap_or(0.0);
    whole + frac / PCT_BASE as f64
}
