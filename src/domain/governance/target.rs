//! Well-known governance targets

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use alloy_primitives::{address, Address};
use serde::Deserialize;

use super::outcome::Thresholds;

/// Which DAO voting app a vote belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Ownership,
    Parameter,
    Emergency,
}

impl VoteType {
    pub const ALL: [VoteType; 3] = [VoteType::Ownership, VoteType::Parameter, VoteType::Emergency];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Ownership => "ownership",
            VoteType::Parameter => "parameter",
            VoteType::Emergency => "emergency",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ownership" => Ok(VoteType::Ownership),
            "parameter" | "param" => Ok(VoteType::Parameter),
            "emergency" => Ok(VoteType::Emergency),
            other => Err(format!(
                "unknown vote type '{}' (expected ownership, parameter or emergency)",
                other
            )),
        }
    }
}

/// Addresses and thresholds of one DAO voting app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceTarget {
    pub vote_type: VoteType,
    /// Agent that executes passed scripts
    pub agent: Address,
    /// Aragon voting app
    pub voting: Address,
    /// Voting-power token
    pub token: Address,
    /// Minimum quorum, whole percent
    pub quorum_percent: u8,
    /// Votes on this app must be created through this forwarder
    pub forwarder: Option<Address>,
    /// Pass criteria used when the vote itself does not carry them
    pub thresholds: Thresholds,
}

/// Partial override of a target, as read from the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetOverride {
    pub agent: Option<Address>,
    pub voting: Option<Address>,
    pub token: Option<Address>,
    pub quorum: Option<u8>,
    pub support: Option<u8>,
    pub forwarder: Option<Address>,
}

/// Immutable registry of the governance targets, built once at start-up
#[derive(Debug, Clone)]
pub struct DaoRegistry {
    targets: BTreeMap<VoteType, GovernanceTarget>,
}

const VECRV: Address = address!("0x5f3b5DfEb7B28CDbD7FAba78963EE202a494e2A2");

/// Curve smart wallet checker (veCRV lock whitelist)
pub const SMARTWALLET_CHECKER: Address = address!("0xca719728Ef172d0961768581fdF35CB116e0B7a4");

impl DaoRegistry {
    /// Curve DAO mainnet deployment
    pub fn curve_mainnet() -> Self {
        let targets = [
            GovernanceTarget {
                vote_type: VoteType::Ownership,
                agent: address!("0x40907540d8a6C65c637785e8f8B742ae6b0b9968"),
                voting: address!("0xE478de485ad2fe566d49342Cbd03E49ed7DB3356"),
                token: VECRV,
                quorum_percent: 30,
                forwarder: None,
                thresholds: Thresholds::from_percent(51, 30),
            },
            GovernanceTarget {
                vote_type: VoteType::Parameter,
                agent: address!("0x4eeb3ba4f221ca16ed4a0cc7254e2e32df948c5f"),
                voting: address!("0xbcff8b0b9419b9a88c44546519b1e909cf330399"),
                token: VECRV,
                quorum_percent: 15,
                forwarder: None,
                thresholds: Thresholds::from_percent(30, 15),
            },
            GovernanceTarget {
                vote_type: VoteType::Emergency,
                agent: address!("0x00669DF67E4827FCc0E48A1838a8d5AB79281909"),
                voting: address!("0x1115c9b3168563354137cdc60efb66552dd50678"),
                token: address!("0x4c0947B16FB1f755A2D32EC21A0c4181f711C500"),
                quorum_percent: 51,
                forwarder: Some(address!("0xf409Ce40B5bb1e4Ef8e97b1979629859c6d5481f")),
                thresholds: Thresholds::from_percent(51, 51),
            },
        ];

        Self {
            targets: targets.into_iter().map(|t| (t.vote_type, t)).collect(),
        }
    }

    /// Apply config overrides on top of the defaults
    pub fn with_overrides(mut self, overrides: &BTreeMap<VoteType, TargetOverride>) -> Self {
        for (vote_type, o) in overrides {
            let Some(target) = self.targets.get_mut(vote_type) else {
                continue;
            };
            if let Some(agent) = o.agent {
                target.agent = agent;
            }
            if let Some(voting) = o.voting {
                target.voting = voting;
            }
            if let Some(token) = o.token {
                target.token = token;
            }
            if let Some(forwarder) = o.forwarder {
                target.forwarder = Some(forwarder);
            }
            if let Some(quorum) = o.quorum {
                target.quorum_percent = quorum;
            }
            let support = o
                .support
                .map(|s| Thresholds::from_percent(s, target.quorum_percent));
            target.thresholds = match support {
                Some(t) => t,
                None => Thresholds {
                    support_required: target.thresholds.support_required,
                    min_accept_quorum: Thresholds::percent(target.quorum_percent),
                },
            };
        }
        self
    }

    pub fn select(&self, vote_type: VoteType) -> &GovernanceTarget {
        // Every VoteType is populated by the constructor
        &self.targets[&vote_type]
    }

    /// Target whose voting app lives at `voting`
    pub fn by_voting(&self, voting: Address) -> Option<&GovernanceTarget> {
        self.targets.values().find(|t| t.voting == voting)
    }

    pub fn targets(&self) -> impl Iterator<Item = &GovernanceTarget> {
        self.targets.values()
    }
}

impl Default for DaoRegistry {
    fn default() -> Self {
        Self::curve_mainnet()
    }
}
