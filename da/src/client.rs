//! HTTP client for the raw proof endpoint.

use std::time::Duration;

use async_trait::async_trait;
use attestor_utils::text::{truncate_for_log, MAX_DIAGNOSTIC_LEN};
use serde::{Deserialize, Serialize};

use crate::DaError;

pub const PROOF_PATH: &str = "/api/v1/fdc/proof-by-request-round-raw";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Proof as served by the DA layer, before ABI decoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawProof {
    /// Merkle siblings, hex strings.
    #[serde(default)]
    pub proof: Vec<String>,
    /// ABI-encoded response, hex.
    pub response_hex: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProofQuery<'a> {
    voting_round_id: u64,
    request_bytes: &'a str,
}

#[derive(Deserialize)]
struct ProofReply {
    #[serde(default)]
    proof: Vec<String>,
    #[serde(default)]
    response_hex: Option<String>,
}

#[async_trait]
pub trait DaApi: Send + Sync {
    /// Look up the proof for a request already spelled in some
    /// [`RequestEncoding`](crate::RequestEncoding).
    async fn proof_by_request_round(
        &self,
        voting_round: u64,
        request_bytes: &str,
    ) -> Result<RawProof, DaError>;
}

pub struct DaClient {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl DaClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            http_client,
        }
    }
}

#[async_trait]
impl DaApi for DaClient {
    async fn proof_by_request_round(
        &self,
        voting_round: u64,
        request_bytes: &str,
    ) -> Result<RawProof, DaError> {
        let url = format!("{}{}", self.base_url, PROOF_PATH);
        let mut request = self.http_client.post(&url).json(&ProofQuery {
            voting_round_id: voting_round,
            request_bytes,
        });
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DaError::Unreachable(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DaError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            tracing::debug!(voting_round, status = status.as_u16(), "proof not served yet");
            return Err(DaError::NotReady {
                status: status.as_u16(),
                body: truncate_for_log(&body, MAX_DIAGNOSTIC_LEN),
            });
        }

        let reply: ProofReply = serde_json::from_str(&body).map_err(|e| {
            DaError::InvalidResponse(format!(
                "{e}: {}",
                truncate_for_log(&body, MAX_DIAGNOSTIC_LEN)
            ))
        })?;
        match reply.response_hex {
            Some(response_hex) if !response_hex.is_empty() => Ok(RawProof {
                proof: reply.proof,
                response_hex,
            }),
            _ => Err(DaError::MissingResponse),
        }
    }
}
