//! Aragon Voting, forwarder and vote-file view bindings

use alloy::primitives::Bytes;
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Aragon Voting app as deployed by Curve
    #[sol(rpc)]
    interface IVoting {
        event StartVote(
            uint256 indexed voteId,
            address indexed creator,
            string metadata,
            uint256 minBalance,
            uint256 minTime,
            uint256 totalSupply,
            uint256 creatorVotingPower
        );

        function newVote(
            bytes _executionScript,
            string _metadata,
            bool _castVote,
            bool _executesIfDecided
        ) external returns (uint256 voteId);

        function canCreateNewVote(address _sender) external view returns (bool);

        function getVote(uint256 _voteId) external view returns (
            bool open,
            bool executed,
            uint64 startDate,
            uint64 snapshotBlock,
            uint64 supportRequired,
            uint64 minAcceptQuorum,
            uint256 yea,
            uint256 nay,
            uint256 votingPower,
            bytes script
        );

        function canExecute(uint256 _voteId) external view returns (bool);

        function executeVote(uint256 _voteId) external;
    }
}

sol! {
    /// Aragon forwarder, e.g. the emergency DAO's token manager
    #[sol(rpc)]
    interface IForwarder {
        function forward(bytes _evmScript) external;
    }
}

sol! {
    /// Liquidity gauge views; older gauges expose `admin` or `owner`
    /// instead of a factory
    #[sol(rpc)]
    interface IGauge {
        function is_killed() external view returns (bool);
        function factory() external view returns (address);
        function admin() external view returns (address);
        function owner() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IGaugeFactory {
        function admin() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface ISmartWalletChecker {
        function check(address _wallet) external view returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    interface IStableSwap {
        function A() external view returns (uint256);
    }
}

/// Revert reason for an unknown vote id
pub const NO_VOTE_REVERT: &str = "VOTING_NO_VOTE";

/// Calldata of `newVote(script, metadata, false, false)`
pub fn new_vote_calldata(script: Bytes, metadata: &str) -> Bytes {
    IVoting::newVoteCall {
        _executionScript: script,
        _metadata: metadata.to_string(),
        _castVote: false,
        _executesIfDecided: false,
    }
    .abi_encode()
    .into()
}
