use thiserror::Error;

/// Every variant means "no proof this time"; the caller decides whether to
/// retry.
#[derive(Debug, Error)]
pub enum DaError {
    #[error("DA service unreachable: {0}")]
    Unreachable(String),

    #[error("DA service answered HTTP {status}: {body}")]
    NotReady { status: u16, body: String },

    #[error("DA response has no response_hex")]
    MissingResponse,

    #[error("invalid DA response: {0}")]
    InvalidResponse(String),
}
