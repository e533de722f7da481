//! Chain client: trait seam plus the alloy-backed implementation.

use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::contracts::{IContractRegistry, IRelay, IRequestHub};
use crate::ChainError;

/// A request transaction that made it into a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    /// `0x`-prefixed transaction hash.
    pub tx_hash: String,
    pub block_number: u64,
    /// Timestamp of the confirming block; the only consensus-agreed time.
    pub block_timestamp: u64,
}

/// Everything the engine needs from the ledger.
#[async_trait]
pub trait AttestationChain: Send + Sync {
    /// Submit `encoded_request` to the hub with the protocol fee and wait
    /// until the transaction is mined.
    async fn submit_request(&self, encoded_request: &[u8]) -> Result<Submission, ChainError>;

    /// Voting round that contains `timestamp`, per the relay.
    async fn voting_round_at(&self, timestamp: u64) -> Result<u64, ChainError>;

    /// Whether `voting_round` is finalized for `protocol_id`.
    async fn is_finalized(&self, protocol_id: u64, voting_round: u64) -> Result<bool, ChainError>;
}

/// Connection settings for [`RpcChain`].
#[derive(Clone, Debug)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub registry_address: String,
    pub hub_name: String,
    pub relay_name: String,
    /// Fee attached to every request, in wei.
    pub request_fee_wei: u128,
    /// How long to wait for the request transaction to be mined.
    pub confirm_timeout: Duration,
}

#[derive(Clone, Copy, Debug)]
struct ContractAddresses {
    hub: Address,
    relay: Address,
}

/// [`AttestationChain`] over JSON-RPC with a local signing key.
///
/// Hub and relay addresses are resolved from the registry on first use and
/// cached for the life of the client; concurrent attestations share them.
pub struct RpcChain {
    provider: DynProvider,
    registry: Address,
    hub_name: String,
    relay_name: String,
    request_fee: U256,
    confirm_timeout: Duration,
    addresses: OnceCell<ContractAddresses>,
}

impl RpcChain {
    /// Build a signing provider for `settings`. No network traffic happens here.
    pub fn connect(settings: &ChainSettings, private_key: &str) -> Result<Self, ChainError> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| ChainError::Config(format!("invalid submitter key: {e}")))?;
        let url: Url = settings
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Config(format!("invalid RPC URL {:?}: {e}", settings.rpc_url)))?;
        let registry: Address = settings.registry_address.parse().map_err(|e| {
            ChainError::Config(format!(
                "invalid registry address {:?}: {e}",
                settings.registry_address
            ))
        })?;

        tracing::info!(submitter = %signer.address(), registry = %registry, "chain client configured");

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            registry,
            hub_name: settings.hub_name.clone(),
            relay_name: settings.relay_name.clone(),
            request_fee: U256::from(settings.request_fee_wei),
            confirm_timeout: settings.confirm_timeout,
            addresses: OnceCell::new(),
        })
    }

    async fn resolve(&self, name: &str) -> Result<Address, ChainError> {
        let registry = IContractRegistry::new(self.registry, self.provider.clone());
        let address = registry
            .getContractAddressByName(name.to_string())
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("getContractAddressByName({name}) failed: {e}")))?;
        if address == Address::ZERO {
            return Err(ChainError::UnknownContract(name.to_string()));
        }
        tracing::debug!(contract = name, address = %address, "resolved contract address");
        Ok(address)
    }

    async fn addresses(&self) -> Result<ContractAddresses, ChainError> {
        self.addresses
            .get_or_try_init(|| async {
                Ok(ContractAddresses {
                    hub: self.resolve(&self.hub_name).await?,
                    relay: self.resolve(&self.relay_name).await?,
                })
            })
            .await
            .copied()
    }
}

fn to_u64(value: U256, what: &str) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::Overflow(format!("{what} = {value}")))
}

#[async_trait]
impl AttestationChain for RpcChain {
    async fn submit_request(&self, encoded_request: &[u8]) -> Result<Submission, ChainError> {
        let addresses = self.addresses().await?;
        let hub = IRequestHub::new(addresses.hub, self.provider.clone());

        let pending = hub
            .requestAttestation(Bytes::copy_from_slice(encoded_request))
            .value(self.request_fee)
            .send()
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(tx = %tx_hash, fee = %self.request_fee, "attestation request sent");

        pending
            .with_timeout(Some(self.confirm_timeout))
            .watch()
            .await
            .map_err(|e| ChainError::Submission(format!("{tx_hash} not mined: {e}")))?;

        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or_else(|| ChainError::ReceiptMissing(tx_hash.to_string()))?;
        if !receipt.status() {
            return Err(ChainError::Reverted(tx_hash.to_string()));
        }
        let block_number = receipt
            .block_number
            .ok_or_else(|| ChainError::ReceiptMissing(tx_hash.to_string()))?;

        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?
            .ok_or(ChainError::BlockMissing(block_number))?;

        Ok(Submission {
            tx_hash: tx_hash.to_string(),
            block_number,
            block_timestamp: block.header.timestamp,
        })
    }

    async fn voting_round_at(&self, timestamp: u64) -> Result<u64, ChainError> {
        let addresses = self.addresses().await?;
        let relay = IRelay::new(addresses.relay, self.provider.clone());
        let round = relay
            .getVotingRoundId(U256::from(timestamp))
            .call()
            .await
            .map_err(|e| ChainError::Rpc(format!("getVotingRoundId({timestamp}) failed: {e}")))?;
        to_u64(round, "voting round")
    }

    async fn is_finalized(&self, protocol_id: u64, voting_round: u64) -> Result<bool, ChainError> {
        let addresses = self.addresses().await?;
        let relay = IRelay::new(addresses.relay, self.provider.clone());
        relay
            .isFinalized(U256::from(protocol_id), U256::from(voting_round))
            .call()
            .await
            .map_err(|e| {
                ChainError::Rpc(format!("isFinalized({protocol_id}, {voting_round}) failed: {e}"))
            })
    }
}
