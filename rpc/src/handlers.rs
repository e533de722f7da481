//! HTTP request handlers.

use attestor_cache::CacheError;
use attestor_engine::AttestRequest;
use attestor_types::{AttestationId, AttestationStatus};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::{AppState, RpcError};

// ── Cache ────────────────────────────────────────────────────────────────

/// `GET /cache/{key}`: the stored JSON, byte for byte.
pub async fn cache_entry(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, RpcError> {
    match state.cache.get(&key) {
        Ok(body) => Ok(([(header::CONTENT_TYPE, "application/json")], body)),
        Err(CacheError::NotFound) => Err(RpcError::NotFound("cache entry".into())),
        Err(e) => Err(RpcError::Server(e.to_string())),
    }
}

// ── Attestations ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StartedResponse {
    pub id: AttestationId,
}

/// `POST /attestations`: start in the background, answer with the id.
pub async fn start_attestation(
    State(state): State<AppState>,
    Json(request): Json<AttestRequest>,
) -> Result<impl IntoResponse, RpcError> {
    let id = state
        .attestor
        .start(request, state.shutdown.child_token())?;
    Ok((StatusCode::ACCEPTED, Json(StartedResponse { id })))
}

/// `GET /attestations/{id}`
pub async fn attestation_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AttestationStatus>, RpcError> {
    let id: AttestationId = id
        .parse()
        .map_err(|_| RpcError::NotFound(format!("attestation {id}")))?;
    Ok(Json(state.store.get(&id)?))
}

/// `GET /attestations`: every record, oldest first.
pub async fn list_attestations(
    State(state): State<AppState>,
) -> Result<Json<Vec<AttestationStatus>>, RpcError> {
    Ok(Json(state.store.list()?))
}

// ── Telemetry ────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub attestations: usize,
    pub cache_entries: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        attestations: state.store.len(),
        cache_entries: state.cache.len(),
    })
}

/// `GET /metrics`: Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    state.metrics.cache_entries.set(state.cache.len() as i64);
    state.metrics.status_records.set(state.store.len() as i64);
    let body = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attestor_cache::CacheProxy;
    use attestor_engine::{Attestor, EngineConfig, EngineMetrics, Records, SecretKey};
    use attestor_nullables::{NullChain, NullClock, NullDa, NullVerifier};
    use attestor_store::{MemoryStatusStore, StatusStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::{router, AppState};

    const TOKEN: &str = "operator-token";

    fn state() -> AppState {
        let clock = Arc::new(NullClock::new(1_000));
        let store: Arc<dyn StatusStore> = Arc::new(MemoryStatusStore::new());
        let records = Records::new(store.clone(), clock.clone());
        let attestor = Attestor::from_config(
            &EngineConfig::default(),
            records,
            Arc::new(NullVerifier::returning(vec![1, 2, 3])),
            Arc::new(NullChain::new(10, 1_000).never_finalized()),
            Arc::new(NullDa::never()),
        );
        AppState {
            cache: Arc::new(CacheProxy::new(clock, attestor_cache::DEFAULT_RETENTION)),
            store,
            attestor: Arc::new(attestor),
            metrics: Arc::new(EngineMetrics::new().unwrap()),
            api_token: Some(SecretKey::new(TOKEN)),
            shutdown: CancellationToken::new(),
        }
    }

    fn authorized(builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder.header("authorization", format!("Bearer {TOKEN}"))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String, Option<String>) {
        let response = app
            .oneshot(authorized(Request::get(uri)).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap(), content_type)
    }

    #[tokio::test]
    async fn cache_entry_is_served_verbatim() {
        let state = state();
        let raw = r#"{"merged":true,"number":7}"#.to_string();
        let key = state.cache.put_raw(raw.clone()).unwrap();

        let (status, body, content_type) = get(router(state), &format!("/cache/{key}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, raw);
        assert_eq!(content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn unknown_cache_key_is_404() {
        let (status, _, _) = get(router(state()), "/cache/0123456789abcdef0123456789abcdef").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_lookup() {
        let state = state();
        let id = state.attestor.records().open().unwrap();

        let (status, body, _) = get(router(state.clone()), &format!("/attestations/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["id"], id.as_str());
        assert_eq!(json["phase"], "preparing");

        let (status, body, _) = get(router(state), "/attestations").await;
        assert_eq!(status, StatusCode::OK);
        let list: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_or_malformed_id_is_404() {
        let state = state();
        let (status, _, _) = get(
            router(state.clone()),
            "/attestations/ffffffffffffffffffffffffffffffff",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = get(router(state), "/attestations/not-an-id").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(start_paused = true)]
    async fn post_starts_attestation_in_background() {
        let state = state();
        let request = authorized(Request::post("/attestations"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "url": "https://src.example/a",
                    "postProcessJq": ".",
                    "abiSignature": "{}"
                })
                .to_string(),
            ))
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        let id = json["id"].as_str().unwrap().to_string();

        let (status, _, _) = get(router(state.clone()), &format!("/attestations/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        state.shutdown.cancel();
    }

    #[tokio::test]
    async fn preset_without_public_url_is_rejected_up_front() {
        let state = state();
        let request = authorized(Request::post("/attestations"))
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"preset": "pull-request", "owner": "o", "repo": "r", "number": 1})
                    .to_string(),
            ))
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["kind"], "configuration");
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn health_and_metrics() {
        let state = state();
        state.metrics.started.inc();

        let (status, body, _) = get(router(state.clone()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cacheEntries"], 0);

        let (status, body, content_type) = get(router(state), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/plain"));
        assert!(body.contains("attestor_attestations_started_total 1"));
    }

    fn direct_request() -> Body {
        Body::from(
            json!({"url": "https://src.example/a", "postProcessJq": ".", "abiSignature": "{}"})
                .to_string(),
        )
    }

    #[tokio::test]
    async fn post_without_token_is_refused() {
        let state = state();
        let request = Request::post("/attestations")
            .header("content-type", "application/json")
            .body(direct_request())
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn wrong_token_is_refused() {
        let state = state();
        for uri in ["/attestations", "/metrics"] {
            let request = Request::get(uri)
                .header("authorization", "Bearer operator-tokem")
                .body(Body::empty())
                .unwrap();
            let response = router(state.clone()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn operator_routes_closed_without_configured_token() {
        let state = AppState {
            api_token: None,
            ..state()
        };
        let request = authorized(Request::post("/attestations"))
            .header("content-type", "application/json")
            .body(direct_request())
            .unwrap();

        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(state.store.is_empty());
    }

    #[tokio::test]
    async fn cache_and_health_need_no_token() {
        let state = state();
        let key = state.cache.put_raw("{}".to_string()).unwrap();
        for uri in [format!("/cache/{key}"), "/health".to_string()] {
            let response = router(state.clone())
                .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
