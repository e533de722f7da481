//! `sol!` bindings for the registry, hub and relay.

use alloy::sol;

sol! {
    /// Name → address registry.
    #[sol(rpc)]
    interface IContractRegistry {
        function getContractAddressByName(string calldata _name) external view returns (address);
    }

    /// Entry point for attestation requests.
    #[sol(rpc)]
    interface IRequestHub {
        function requestAttestation(bytes calldata _data) external payable;
    }

    /// Voting round bookkeeping and finalization flags.
    #[sol(rpc)]
    interface IRelay {
        function getVotingRoundId(uint256 _timestamp) external view returns (uint256);
        function isFinalized(uint256 _protocolId, uint256 _votingRoundId) external view returns (bool);
    }
}

/// Registry name of the request hub.
pub const DEFAULT_HUB_NAME: &str = "FdcHub";

/// Registry name of the relay.
pub const DEFAULT_RELAY_NAME: &str = "Relay";
