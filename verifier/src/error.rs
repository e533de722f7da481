use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifierError {
    #[error("verifier unreachable: {0}")]
    Unreachable(String),

    #[error("verifier rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("verifier returned no encoded request (status: {0})")]
    NoEncodedRequest(String),

    #[error("invalid response from verifier: {0}")]
    InvalidResponse(String),
}
