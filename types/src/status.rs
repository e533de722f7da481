//! The per-attestation status record.

use serde::{Deserialize, Serialize};

use crate::{AttestationId, DecodedProof, ErrorKind, Phase, Timestamp, TypesError};

/// Lifecycle record of one attestation attempt.
///
/// Fields are private so every mutation goes through a transition method;
/// that keeps the record invariants in one place:
/// - `voting_round` is set once the submission confirmed,
/// - `proof` is set iff the phase is `proof-ready`,
/// - `error` is set iff the phase is `failed`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationStatus {
    id: AttestationId,
    phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    voting_round: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proof: Option<DecodedProof>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl AttestationStatus {
    /// A fresh record in phase `preparing`.
    pub fn new(id: AttestationId, now: Timestamp) -> Self {
        Self {
            id,
            phase: Phase::Preparing,
            voting_round: None,
            tx_hash: None,
            proof: None,
            error: None,
            error_kind: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &AttestationId {
        &self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn voting_round(&self) -> Option<u64> {
        self.voting_round
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    pub fn proof(&self) -> Option<&DecodedProof> {
        self.proof.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn advance(&mut self, next: Phase, now: Timestamp) -> Result<(), TypesError> {
        if !self.phase.can_transition_to(next) {
            return Err(TypesError::IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        self.updated_at = now;
        Ok(())
    }

    /// `preparing -> submitted`, recording the confirmed round and transaction.
    pub fn mark_submitted(
        &mut self,
        voting_round: u64,
        tx_hash: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), TypesError> {
        self.advance(Phase::Submitted, now)?;
        self.voting_round = Some(voting_round);
        self.tx_hash = Some(tx_hash.into());
        Ok(())
    }

    /// `submitted -> waiting`.
    pub fn mark_waiting(&mut self, now: Timestamp) -> Result<(), TypesError> {
        self.advance(Phase::Waiting, now)
    }

    /// `waiting -> finalized`.
    pub fn mark_finalized(&mut self, now: Timestamp) -> Result<(), TypesError> {
        self.advance(Phase::Finalized, now)
    }

    /// `finalized -> proof-ready`, attaching the decoded proof.
    pub fn mark_proof_ready(
        &mut self,
        proof: DecodedProof,
        now: Timestamp,
    ) -> Result<(), TypesError> {
        self.advance(Phase::ProofReady, now)?;
        self.proof = Some(proof);
        Ok(())
    }

    /// Any non-terminal phase `-> failed`.
    pub fn mark_failed(
        &mut self,
        kind: ErrorKind,
        error: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), TypesError> {
        self.advance(Phase::Failed, now)?;
        self.proof = None;
        self.error = Some(error.into());
        self.error_kind = Some(kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AttestationResponse, Bytes32, RequestBody, ResponseBody};

    fn fresh() -> AttestationStatus {
        AttestationStatus::new(AttestationId::generate().unwrap(), Timestamp::new(100))
    }

    fn proof(round: u64) -> DecodedProof {
        DecodedProof {
            merkle_proof: Vec::new(),
            data: AttestationResponse {
                attestation_type: Bytes32::ZERO,
                source_id: Bytes32::ZERO,
                voting_round: round,
                lowest_used_timestamp: 0,
                request_body: RequestBody::default(),
                response_body: ResponseBody::default(),
            },
        }
    }

    fn round_matches_phase(status: &AttestationStatus) -> bool {
        status.voting_round().is_some() == status.phase().has_voting_round()
    }

    #[test]
    fn full_lifecycle_keeps_invariants() {
        let mut status = fresh();
        assert_eq!(status.phase(), Phase::Preparing);
        assert!(status.voting_round().is_none());
        assert!(round_matches_phase(&status));

        status.mark_submitted(7, "0xabc", Timestamp::new(101)).unwrap();
        assert_eq!(status.voting_round(), Some(7));
        assert_eq!(status.tx_hash(), Some("0xabc"));
        assert!(round_matches_phase(&status));

        status.mark_waiting(Timestamp::new(102)).unwrap();
        assert!(round_matches_phase(&status));
        status.mark_finalized(Timestamp::new(190)).unwrap();
        assert!(round_matches_phase(&status));
        assert!(status.proof().is_none());

        status.mark_proof_ready(proof(7), Timestamp::new(230)).unwrap();
        assert!(round_matches_phase(&status));
        assert_eq!(status.phase(), Phase::ProofReady);
        assert!(status.proof().is_some());
        assert!(status.error().is_none());
        assert_eq!(status.updated_at(), Timestamp::new(230));
        assert_eq!(status.created_at(), Timestamp::new(100));
    }

    #[test]
    fn failure_records_kind_and_message() {
        let mut status = fresh();
        status
            .mark_failed(ErrorKind::UpstreamRejection, "verifier said no", Timestamp::new(101))
            .unwrap();
        assert_eq!(status.phase(), Phase::Failed);
        assert_eq!(status.error(), Some("verifier said no"));
        assert_eq!(status.error_kind(), Some(ErrorKind::UpstreamRejection));
        assert!(status.proof().is_none());
    }

    #[test]
    fn cannot_fail_after_proof_ready() {
        let mut status = fresh();
        status.mark_submitted(1, "0x1", Timestamp::new(1)).unwrap();
        status.mark_waiting(Timestamp::new(1)).unwrap();
        status.mark_finalized(Timestamp::new(1)).unwrap();
        status.mark_proof_ready(proof(1), Timestamp::new(1)).unwrap();
        let err = status
            .mark_failed(ErrorKind::Timeout, "late", Timestamp::new(2))
            .unwrap_err();
        assert!(matches!(err, TypesError::IllegalTransition { .. }));
        assert!(status.error().is_none());
    }

    #[test]
    fn cannot_skip_to_proof_ready() {
        let mut status = fresh();
        assert!(status.mark_proof_ready(proof(1), Timestamp::new(1)).is_err());
        assert!(status.proof().is_none());
    }

    #[test]
    fn failed_json_omits_proof() {
        let mut status = fresh();
        status
            .mark_failed(ErrorKind::Timeout, "round 7 not finalized", Timestamp::new(400))
            .unwrap();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["phase"], "failed");
        assert_eq!(json["errorKind"], "timeout");
        assert!(json.get("proof").is_none());
    }
}
