//! Stage 4: retrieve and decode the proof once the round is finalized.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attestor_codec::{decode_hex, decode_response, CodecError};
use attestor_da::{DaApi, RawProof, RequestEncoding, DEFAULT_ENCODINGS};
use attestor_types::{AttestationId, Bytes32, DecodedProof};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{EngineError, Records};

/// Retry budget for the DA layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Pause before the first attempt; DA indexing lags finalization.
    pub settle: Duration,
    pub max_attempts: u32,
    pub interval: Duration,
    /// Request-byte spellings tried on every attempt, in order.
    pub encodings: Vec<RequestEncoding>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(30),
            max_attempts: 30,
            interval: Duration::from_secs(10),
            encodings: DEFAULT_ENCODINGS.to_vec(),
        }
    }
}

#[async_trait]
pub trait ProofFetcher: Send + Sync {
    /// `finalized -> proof-ready | failed`.
    async fn fetch(
        &self,
        encoded_request: &[u8],
        voting_round: u64,
        id: &AttestationId,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError>;
}

pub struct DaProofFetcher {
    da: Arc<dyn DaApi>,
    records: Records,
    policy: FetchPolicy,
}

impl DaProofFetcher {
    pub fn new(da: Arc<dyn DaApi>, records: Records, policy: FetchPolicy) -> Self {
        Self {
            da,
            records,
            policy,
        }
    }

    /// One pass over every encoding. `None` means "not ready yet".
    async fn attempt(
        &self,
        encoded_request: &[u8],
        voting_round: u64,
        id: &AttestationId,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<RawProof>, EngineError> {
        for &encoding in &self.policy.encodings {
            let request_bytes = encoding.encode(encoded_request);
            let reply = tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled("fetching proof")),
                reply = self.da.proof_by_request_round(voting_round, &request_bytes) => reply,
            };
            match reply {
                Ok(raw) => {
                    tracing::info!(attestation_id = %id, voting_round, attempt, encoding = %encoding, "proof available");
                    return Ok(Some(raw));
                }
                Err(e) => {
                    tracing::debug!(attestation_id = %id, voting_round, attempt, encoding = %encoding, error = %e, "proof not ready");
                }
            }
        }
        Ok(None)
    }

    async fn try_fetch(
        &self,
        encoded_request: &[u8],
        voting_round: u64,
        id: &AttestationId,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError> {
        pause(self.policy.settle, cancel).await?;

        for attempt in 1..=self.policy.max_attempts {
            let served = self
                .attempt(encoded_request, voting_round, id, attempt, cancel)
                .await?;
            if let Some(raw) = served {
                let proof = decode_raw(&raw)?;
                if proof.data.voting_round == voting_round {
                    let stored = proof.clone();
                    self.records
                        .advance(id, |status, now| status.mark_proof_ready(stored.clone(), now))?;
                    return Ok(proof);
                }
                // Stale index entry; keep polling for the submitted round.
                tracing::warn!(
                    attestation_id = %id,
                    expected = voting_round,
                    actual = proof.data.voting_round,
                    attempt,
                    "proof carries a different voting round"
                );
            }
            if attempt < self.policy.max_attempts {
                pause(self.policy.interval, cancel).await?;
            }
        }

        Err(EngineError::ProofUnavailable {
            voting_round,
            attempts: self.policy.max_attempts,
        })
    }
}

#[async_trait]
impl ProofFetcher for DaProofFetcher {
    async fn fetch(
        &self,
        encoded_request: &[u8],
        voting_round: u64,
        id: &AttestationId,
        cancel: &CancellationToken,
    ) -> Result<DecodedProof, EngineError> {
        self.try_fetch(encoded_request, voting_round, id, cancel)
            .await
            .inspect_err(|e| self.records.fail(id, e))
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), EngineError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(EngineError::Cancelled("fetching proof")),
        _ = sleep(duration) => Ok(()),
    }
}

/// Decode the DA layer's hex into a structured proof.
pub fn decode_raw(raw: &RawProof) -> Result<DecodedProof, EngineError> {
    let response = decode_response(&decode_hex(&raw.response_hex)?)?;
    let merkle_proof = raw
        .proof
        .iter()
        .map(|node| Bytes32::from_hex(node).map_err(|e| CodecError::InvalidHex(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DecodedProof {
        merkle_proof,
        data: response,
    })
}
