use attestor_types::TypesError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("attestation not found: {0}")]
    NotFound(String),

    #[error("duplicate attestation id: {0}")]
    Duplicate(String),

    #[error("rejected update: {0}")]
    Transition(#[from] TypesError),

    #[error("storage backend error: {0}")]
    Backend(String),
}
