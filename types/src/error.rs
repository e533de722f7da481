//! Error taxonomy shared across crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable failure category attached to a failed attestation.
///
/// Callers use this to decide whether resubmitting makes sense: configuration
/// and decode failures will not fix themselves, timeouts and transient
/// failures might.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Missing public URL, unresolvable registry name, bad credentials.
    Configuration,
    /// Verifier or DA layer answered with a non-success status or malformed body.
    UpstreamRejection,
    /// A polling budget was exhausted.
    Timeout,
    /// Connection-level failure on a one-shot call.
    Transient,
    /// Response bytes did not match the expected ABI layout.
    Decode,
    /// The submitting transaction reverted or its receipt went missing.
    Submission,
    /// The caller cancelled a long-running stage.
    Cancelled,
    /// The status store refused an operation.
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::UpstreamRejection => "upstream-rejection",
            Self::Timeout => "timeout",
            Self::Transient => "transient",
            Self::Decode => "decode",
            Self::Submission => "submission",
            Self::Cancelled => "cancelled",
            Self::Store => "store",
        }
    }

    /// Every kind, in declaration order. Used to pre-register metric labels.
    pub const ALL: [ErrorKind; 8] = [
        Self::Configuration,
        Self::UpstreamRejection,
        Self::Timeout,
        Self::Transient,
        Self::Decode,
        Self::Submission,
        Self::Cancelled,
        Self::Store,
    ];
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while constructing or parsing the basic types.
#[derive(Debug, Error)]
pub enum TypesError {
    #[error("tag {0:?} is longer than 32 bytes")]
    TagTooLong(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid attestation id: {0}")]
    InvalidId(String),

    #[error("system randomness unavailable: {0}")]
    Randomness(String),

    #[error("illegal phase transition from {from} to {to}")]
    IllegalTransition {
        from: crate::Phase,
        to: crate::Phase,
    },
}
