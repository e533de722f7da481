//! Attestation lifecycle phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an attestation currently is in its lifecycle.
///
/// ```text
/// preparing -> submitted -> waiting -> finalized -> proof-ready
///     \            \           \           \
///      `------------`-----------`-----------`----> failed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Request body is being exchanged with the verifier.
    Preparing,
    /// Request transaction confirmed; voting round known.
    Submitted,
    /// Polling the relay for round finalization.
    Waiting,
    /// Round finalized; proof not yet retrieved.
    Finalized,
    /// Proof retrieved and decoded.
    ProofReady,
    /// A stage failed; see the record's error.
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Submitted => "submitted",
            Self::Waiting => "waiting",
            Self::Finalized => "finalized",
            Self::ProofReady => "proof-ready",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ProofReady | Self::Failed)
    }

    /// Whether a voting round has been assigned by the time this phase is reached.
    pub fn has_voting_round(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Waiting | Self::Finalized | Self::ProofReady
        )
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: Phase) -> bool {
        match (self, next) {
            (Self::Preparing, Self::Submitted)
            | (Self::Submitted, Self::Waiting)
            | (Self::Waiting, Self::Finalized)
            | (Self::Finalized, Self::ProofReady) => true,
            (from, Self::Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
