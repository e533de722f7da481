//! Axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use attestor_cache::CacheProxy;
use attestor_engine::{Attestor, EngineMetrics, SecretKey};
use attestor_store::StatusStore;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::handlers;
use crate::RpcError;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheProxy>,
    pub store: Arc<dyn StatusStore>,
    pub attestor: Arc<Attestor>,
    pub metrics: Arc<EngineMetrics>,
    /// Bearer token for the operator routes; `None` closes them.
    pub api_token: Option<SecretKey>,
    /// Parent of every background attestation's cancellation token.
    pub shutdown: CancellationToken,
}

/// `/cache/{key}` and `/health` are public; every other route requires the
/// bearer token.
pub fn router(state: AppState) -> Router {
    let operator = Router::new()
        .route(
            "/attestations",
            get(handlers::list_attestations).post(handlers::start_attestation),
        )
        .route("/attestations/:id", get(handlers::attestation_status))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/cache/:key", get(handlers::cache_entry))
        .route("/health", get(handlers::health))
        .merge(operator)
        .with_state(state)
}

async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = &state.api_token else {
        return RpcError::Unauthorized("operator routes are disabled; set api_token").into_response();
    };
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| tokens_match(token, expected.expose()));
    if !authorized {
        return RpcError::Unauthorized("missing or invalid bearer token").into_response();
    }
    next.run(request).await
}

/// Comparison time depends only on the lengths.
fn tokens_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

pub struct RpcServer {
    pub addr: SocketAddr,
}

impl RpcServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Serve until `state.shutdown` is cancelled.
    pub async fn serve(&self, state: AppState) -> Result<(), RpcError> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        tracing::info!(addr = %self.addr, "HTTP server listening");

        let shutdown = state.shutdown.clone();
        axum::serve(listener, router(state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
