//! HTTP error types.

use attestor_engine::AttestationFailure;
use attestor_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("attestation rejected: {0}")]
    Rejected(#[from] AttestationFailure),

    #[error("store error: {0}")]
    Store(String),

    #[error("server error: {0}")]
    Server(String),
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => RpcError::NotFound(format!("attestation {id}")),
            other => RpcError::Store(other.to_string()),
        }
    }
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            RpcError::InvalidRequest(_) | RpcError::Rejected(_) => StatusCode::BAD_REQUEST,
            RpcError::Store(_) | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RpcError::Rejected(failure) => json!({
                "error": failure.error.to_string(),
                "kind": failure.kind(),
            }),
            other => json!({ "error": other.to_string() }),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(body)).into_response()
    }
}
