//! Stage 3: wait for the relay to finalize the request's voting round.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use attestor_chain::AttestationChain;
use attestor_types::AttestationId;
use tokio::time::{sleep, timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::{EngineError, Records};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(5 * 60),
            poll_interval: Duration::from_secs(10),
        }
    }
}

#[async_trait]
pub trait FinalizationWaiter: Send + Sync {
    /// `submitted -> waiting -> finalized | failed`.
    ///
    /// `Ok(true)` once finalized. `Ok(false)` when `max_wait` ran out; the
    /// record is then already failed with a timeout. `Err` on cancellation
    /// or when the record itself cannot be updated.
    async fn wait(
        &self,
        voting_round: u64,
        id: &AttestationId,
        policy: WaitPolicy,
        cancel: &CancellationToken,
    ) -> Result<bool, EngineError>;
}

/// Polls the relay's finalization predicate. Transport errors count as
/// "not yet".
pub struct RelayWaiter {
    chain: Arc<dyn AttestationChain>,
    records: Records,
    protocol_id: u64,
}

impl RelayWaiter {
    pub fn new(chain: Arc<dyn AttestationChain>, records: Records, protocol_id: u64) -> Self {
        Self {
            chain,
            records,
            protocol_id,
        }
    }

    async fn poll(&self, voting_round: u64, id: &AttestationId, attempt: u32) -> bool {
        match self.chain.is_finalized(self.protocol_id, voting_round).await {
            Ok(finalized) => {
                tracing::debug!(attestation_id = %id, voting_round, attempt, finalized, "polled relay");
                finalized
            }
            Err(e) => {
                tracing::debug!(attestation_id = %id, voting_round, attempt, error = %e, "relay poll failed");
                false
            }
        }
    }
}

#[async_trait]
impl FinalizationWaiter for RelayWaiter {
    async fn wait(
        &self,
        voting_round: u64,
        id: &AttestationId,
        policy: WaitPolicy,
        cancel: &CancellationToken,
    ) -> Result<bool, EngineError> {
        self.records
            .advance(id, |status, now| status.mark_waiting(now))
            .inspect_err(|e| self.records.fail(id, e))?;

        let deadline = Instant::now() + policy.max_wait;
        let mut attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                let err = EngineError::Cancelled("waiting for finalization");
                self.records.fail(id, &err);
                return Err(err);
            }

            attempt += 1;
            let finalized = tokio::select! {
                _ = cancel.cancelled() => continue,
                polled = timeout_at(deadline, self.poll(voting_round, id, attempt)) => {
                    polled.unwrap_or_else(|_| {
                        tracing::debug!(attestation_id = %id, voting_round, attempt, "relay poll outlived the wait budget");
                        false
                    })
                }
            };
            if finalized {
                self.records
                    .advance(id, |status, now| status.mark_finalized(now))
                    .inspect_err(|e| self.records.fail(id, e))?;
                tracing::info!(attestation_id = %id, voting_round, attempt, "voting round finalized");
                return Ok(true);
            }

            if Instant::now() >= deadline {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = sleep(policy.poll_interval) => {}
            }
        }

        let err = EngineError::FinalizationTimeout {
            voting_round,
            waited: policy.max_wait,
        };
        self.records.fail(id, &err);
        Ok(false)
    }
}
