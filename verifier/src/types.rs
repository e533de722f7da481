//! Wire types of the prepare-request endpoint.

use attestor_types::{
    Bytes32, RequestBody, TypesError, ATTESTATION_TYPE_WEB2_JSON, SOURCE_ID_PUBLIC_WEB2,
};
use serde::{Deserialize, Serialize};

/// Literal used for unused headers / query params / body.
pub const EMPTY_OBJECT: &str = "{}";

/// Envelope sent to the verifier.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub attestation_type: Bytes32,
    pub source_id: Bytes32,
    pub request_body: RequestBody,
}

impl PrepareRequest {
    /// A `Web2Json` / `PublicWeb2` request with empty headers, query params and body.
    pub fn web2_json(
        url: impl Into<String>,
        http_method: impl Into<String>,
        post_process_jq: impl Into<String>,
        abi_signature: impl Into<String>,
    ) -> Result<Self, TypesError> {
        Ok(Self {
            attestation_type: Bytes32::from_ascii(ATTESTATION_TYPE_WEB2_JSON)?,
            source_id: Bytes32::from_ascii(SOURCE_ID_PUBLIC_WEB2)?,
            request_body: RequestBody {
                url: url.into(),
                http_method: http_method.into(),
                headers: EMPTY_OBJECT.into(),
                query_params: EMPTY_OBJECT.into(),
                body: EMPTY_OBJECT.into(),
                post_process_jq: post_process_jq.into(),
                abi_signature: abi_signature.into(),
            },
        })
    }
}

/// Verifier reply. `abiEncodedRequest` is absent when the verifier could not
/// fetch or filter the source; `status` then says why.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub abi_encoded_request: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_matches_wire_shape() {
        let req = PrepareRequest::web2_json("https://x.example/a", "GET", ".a", "{}").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json["attestationType"],
            "0x576562324a736f6e000000000000000000000000000000000000000000000000"
        );
        assert_eq!(json["requestBody"]["headers"], "{}");
        assert_eq!(json["requestBody"]["queryParams"], "{}");
        assert_eq!(json["requestBody"]["postProcessJq"], ".a");
        assert_eq!(json["requestBody"]["abiSignature"], "{}");
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let resp: PrepareResponse = serde_json::from_str(r#"{"status":"INVALID"}"#).unwrap();
        assert!(resp.abi_encoded_request.is_none());
    }
}
