//! HTTP client for the prepare-request endpoint.

use std::time::Duration;

use async_trait::async_trait;
use attestor_utils::text::{truncate_for_log, MAX_DIAGNOSTIC_LEN};

use crate::{PrepareRequest, PrepareResponse, VerifierError};

/// Path of the prepare endpoint relative to the verifier base URL.
pub const PREPARE_PATH: &str = "/verifier/web2/Web2Json/prepareRequest";

/// Default timeout for the prepare call. The verifier fetches the source
/// synchronously, so this has to cover that fetch too.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Exchanges a request envelope for encoded request bytes.
#[async_trait]
pub trait VerifierApi: Send + Sync {
    /// Returns the non-empty encoded request.
    async fn prepare_request(&self, request: &PrepareRequest) -> Result<Vec<u8>, VerifierError>;
}

/// `reqwest`-backed verifier client.
pub struct VerifierClient {
    base_url: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl VerifierClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        }
    }
}

#[async_trait]
impl VerifierApi for VerifierClient {
    async fn prepare_request(&self, request: &PrepareRequest) -> Result<Vec<u8>, VerifierError> {
        let url = format!("{}{}", self.base_url, PREPARE_PATH);
        tracing::debug!(url = %url, target = %request.request_body.url, "preparing request");

        let response = self
            .http_client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| VerifierError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VerifierError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(VerifierError::Rejected {
                status: status.as_u16(),
                body: truncate_for_log(&body, MAX_DIAGNOSTIC_LEN),
            });
        }

        let parsed: PrepareResponse = serde_json::from_str(&body).map_err(|e| {
            VerifierError::InvalidResponse(format!(
                "{e}: {}",
                truncate_for_log(&body, MAX_DIAGNOSTIC_LEN)
            ))
        })?;

        let verifier_status = parsed.status.unwrap_or_else(|| "unknown".into());
        let encoded = parsed
            .abi_encoded_request
            .ok_or_else(|| VerifierError::NoEncodedRequest(verifier_status.clone()))?;
        let bytes = attestor_codec::decode_hex(&encoded)
            .map_err(|e| VerifierError::InvalidResponse(e.to_string()))?;
        if bytes.is_empty() {
            return Err(VerifierError::NoEncodedRequest(verifier_status));
        }
        Ok(bytes)
    }
}
