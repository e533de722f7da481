use std::fmt;
use std::time::Duration;

use attestor_cache::CacheError;
use attestor_chain::ChainError;
use attestor_codec::CodecError;
use attestor_store::StoreError;
use attestor_types::{AttestationId, ErrorKind, TypesError};
use attestor_verifier::VerifierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error(transparent)]
    Verifier(#[from] VerifierError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("proof decode failed: {0}")]
    Codec(#[from] CodecError),

    #[error("source prefetch failed: {0}")]
    Cache(#[from] CacheError),

    #[error("status store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Types(#[from] TypesError),

    #[error("voting round {voting_round} not finalized within {waited:?}")]
    FinalizationTimeout { voting_round: u64, waited: Duration },

    #[error("no proof after all retries (round {voting_round}, {attempts} attempts)")]
    ProofUnavailable { voting_round: u64, attempts: u32 },

    #[error("cancelled while {0}")]
    Cancelled(&'static str),
}

impl EngineError {
    /// Category recorded on the failed status record.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Config(_) | EngineError::InvalidSource(_) => ErrorKind::Configuration,
            EngineError::Verifier(e) => match e {
                VerifierError::Unreachable(_) => ErrorKind::Transient,
                VerifierError::Rejected { .. }
                | VerifierError::NoEncodedRequest(_)
                | VerifierError::InvalidResponse(_) => ErrorKind::UpstreamRejection,
            },
            EngineError::Chain(e) => match e {
                ChainError::Config(_) | ChainError::UnknownContract(_) => ErrorKind::Configuration,
                ChainError::Rpc(_) => ErrorKind::Transient,
                ChainError::Submission(_)
                | ChainError::Reverted(_)
                | ChainError::ReceiptMissing(_)
                | ChainError::BlockMissing(_) => ErrorKind::Submission,
                ChainError::Overflow(_) => ErrorKind::Decode,
            },
            EngineError::Codec(_) => ErrorKind::Decode,
            EngineError::Cache(e) => match e {
                CacheError::MissingPublicUrl => ErrorKind::Configuration,
                CacheError::Fetch(_) => ErrorKind::Transient,
                CacheError::Upstream { .. } | CacheError::InvalidSource(_) => {
                    ErrorKind::UpstreamRejection
                }
                CacheError::NotFound
                | CacheError::Serialization(_)
                | CacheError::Randomness(_)
                | CacheError::Poisoned => ErrorKind::Store,
            },
            EngineError::Store(_) | EngineError::Types(_) => ErrorKind::Store,
            EngineError::FinalizationTimeout { .. } | EngineError::ProofUnavailable { .. } => {
                ErrorKind::Timeout
            }
            EngineError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }
}

/// A failed attestation, tagged with its record id when one was created.
#[derive(Debug)]
pub struct AttestationFailure {
    pub id: Option<AttestationId>,
    pub error: EngineError,
}

impl AttestationFailure {
    pub fn new(id: &AttestationId, error: EngineError) -> Self {
        Self {
            id: Some(id.clone()),
            error,
        }
    }

    /// Failure before any record existed.
    pub fn unrecorded(error: EngineError) -> Self {
        Self { id: None, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for AttestationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "attestation {id} failed: {}", self.error),
            None => write!(f, "attestation failed: {}", self.error),
        }
    }
}

impl std::error::Error for AttestationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
