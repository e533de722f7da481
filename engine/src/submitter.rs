//! Stage 2: put the request on-chain and learn its voting round.

use std::sync::Arc;

use async_trait::async_trait;
use attestor_chain::AttestationChain;
use attestor_types::AttestationId;

use crate::{EngineError, Records};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedRequest {
    pub tx_hash: String,
    pub voting_round: u64,
}

#[async_trait]
pub trait Submitter: Send + Sync {
    /// Submit and confirm; on success the record is `submitted` with its round.
    async fn submit(
        &self,
        encoded_request: &[u8],
        id: &AttestationId,
    ) -> Result<SubmittedRequest, EngineError>;
}

/// Submits through the request hub. The voting round is derived from the
/// confirming block's timestamp only.
pub struct ChainSubmitter {
    chain: Arc<dyn AttestationChain>,
    records: Records,
}

impl ChainSubmitter {
    pub fn new(chain: Arc<dyn AttestationChain>, records: Records) -> Self {
        Self { chain, records }
    }

    async fn try_submit(
        &self,
        encoded_request: &[u8],
        id: &AttestationId,
    ) -> Result<SubmittedRequest, EngineError> {
        let submission = self.chain.submit_request(encoded_request).await?;
        let voting_round = self.chain.voting_round_at(submission.block_timestamp).await?;
        tracing::info!(
            attestation_id = %id,
            tx = %submission.tx_hash,
            block = submission.block_number,
            voting_round,
            "request confirmed"
        );

        let tx_hash = submission.tx_hash;
        self.records.advance(id, |status, now| {
            status.mark_submitted(voting_round, tx_hash.clone(), now)
        })?;
        Ok(SubmittedRequest {
            tx_hash,
            voting_round,
        })
    }
}

#[async_trait]
impl Submitter for ChainSubmitter {
    async fn submit(
        &self,
        encoded_request: &[u8],
        id: &AttestationId,
    ) -> Result<SubmittedRequest, EngineError> {
        self.try_submit(encoded_request, id).await.inspect_err(|e| {
            self.records.fail(id, e);
        })
    }
}
