//! Stage 1: exchange a source description for an encoded request.

use std::sync::Arc;

use async_trait::async_trait;
use attestor_types::AttestationId;
use attestor_verifier::{PrepareRequest, VerifierApi};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Records};

/// What to attest: a URL, how to fetch it, how to filter it and how to pack
/// the filtered result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Web2JsonSource {
    pub url: String,
    #[serde(default = "default_http_method")]
    pub http_method: String,
    /// jq expression applied to the fetched document.
    pub post_process_jq: String,
    /// JSON ABI fragment describing the filtered result.
    pub abi_signature: String,
}

fn default_http_method() -> String {
    "GET".to_string()
}

impl Web2JsonSource {
    pub fn get(
        url: impl Into<String>,
        post_process_jq: impl Into<String>,
        abi_signature: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            http_method: default_http_method(),
            post_process_jq: post_process_jq.into(),
            abi_signature: abi_signature.into(),
        }
    }
}

/// Encoded request bytes ready for submission, and the record tracking them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedRequest {
    pub id: AttestationId,
    pub encoded_request: Vec<u8>,
}

#[async_trait]
pub trait RequestPreparer: Send + Sync {
    /// Returns the non-empty encoded request for the record `id`, which must
    /// exist in `preparing`. The record is marked failed on error.
    async fn prepare(&self, id: &AttestationId, source: &Web2JsonSource)
        -> Result<Vec<u8>, EngineError>;
}

/// Prepares requests through the external verifier. Never retries.
pub struct VerifierPreparer {
    verifier: Arc<dyn VerifierApi>,
    records: Records,
}

impl VerifierPreparer {
    pub fn new(verifier: Arc<dyn VerifierApi>, records: Records) -> Self {
        Self { verifier, records }
    }

    async fn try_prepare(&self, source: &Web2JsonSource) -> Result<Vec<u8>, EngineError> {
        let request = PrepareRequest::web2_json(
            source.url.as_str(),
            source.http_method.as_str(),
            source.post_process_jq.as_str(),
            source.abi_signature.as_str(),
        )?;
        Ok(self.verifier.prepare_request(&request).await?)
    }
}

#[async_trait]
impl RequestPreparer for VerifierPreparer {
    async fn prepare(
        &self,
        id: &AttestationId,
        source: &Web2JsonSource,
    ) -> Result<Vec<u8>, EngineError> {
        tracing::info!(attestation_id = %id, url = %source.url, "preparing request");
        match self.try_prepare(source).await {
            Ok(encoded) => {
                tracing::debug!(attestation_id = %id, bytes = encoded.len(), "request prepared");
                Ok(encoded)
            }
            Err(e) => {
                self.records.fail(id, &e);
                Err(e)
            }
        }
    }
}
