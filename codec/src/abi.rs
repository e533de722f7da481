//! `sol!` bindings for the Web2Json response and proof structs.

use alloy::primitives::{Bytes, B256};
use alloy::sol;
use alloy::sol_types::SolValue;
use attestor_types::{AttestationResponse, Bytes32, DecodedProof, RequestBody, ResponseBody};

use crate::CodecError;

sol! {
    /// Request echoed inside an attestation response.
    struct Web2JsonRequestBody {
        string url;
        string httpMethod;
        string headers;
        string queryParams;
        string body;
        string postProcessJq;
        string abiSignature;
    }

    /// Filtered source data, packed per the request's ABI signature.
    struct Web2JsonResponseBody {
        bytes abiEncodedData;
    }

    /// The leaf committed to by a voting round's Merkle root.
    struct Web2JsonResponse {
        bytes32 attestationType;
        bytes32 sourceId;
        uint64 votingRound;
        uint64 lowestUsedTimestamp;
        Web2JsonRequestBody requestBody;
        Web2JsonResponseBody responseBody;
    }

    /// Argument accepted by the verifier contract's `verifyJsonApi`-style calls.
    struct Web2JsonProof {
        bytes32[] merkleProof;
        Web2JsonResponse data;
    }
}

impl From<Web2JsonResponse> for AttestationResponse {
    fn from(r: Web2JsonResponse) -> Self {
        Self {
            attestation_type: Bytes32::new(r.attestationType.0),
            source_id: Bytes32::new(r.sourceId.0),
            voting_round: r.votingRound,
            lowest_used_timestamp: r.lowestUsedTimestamp,
            request_body: RequestBody {
                url: r.requestBody.url,
                http_method: r.requestBody.httpMethod,
                headers: r.requestBody.headers,
                query_params: r.requestBody.queryParams,
                body: r.requestBody.body,
                post_process_jq: r.requestBody.postProcessJq,
                abi_signature: r.requestBody.abiSignature,
            },
            response_body: ResponseBody {
                abi_encoded_data: r.responseBody.abiEncodedData.to_vec(),
            },
        }
    }
}

impl From<&AttestationResponse> for Web2JsonResponse {
    fn from(r: &AttestationResponse) -> Self {
        let req = &r.request_body;
        Self {
            attestationType: B256::from(*r.attestation_type.as_bytes()),
            sourceId: B256::from(*r.source_id.as_bytes()),
            votingRound: r.voting_round,
            lowestUsedTimestamp: r.lowest_used_timestamp,
            requestBody: Web2JsonRequestBody {
                url: req.url.clone(),
                httpMethod: req.http_method.clone(),
                headers: req.headers.clone(),
                queryParams: req.query_params.clone(),
                body: req.body.clone(),
                postProcessJq: req.post_process_jq.clone(),
                abiSignature: req.abi_signature.clone(),
            },
            responseBody: Web2JsonResponseBody {
                abiEncodedData: Bytes::from(r.response_body.abi_encoded_data.clone()),
            },
        }
    }
}

/// Decode `abi.encode(Response)` bytes as served by the DA layer.
pub fn decode_response(bytes: &[u8]) -> Result<AttestationResponse, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Decode("empty response".into()));
    }
    let decoded =
        Web2JsonResponse::abi_decode(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(decoded.into())
}

/// Encode a response into its on-chain byte layout.
pub fn encode_response(response: &AttestationResponse) -> Vec<u8> {
    Web2JsonResponse::from(response).abi_encode()
}

/// Encode a decoded proof as `abi.encode(Proof)`, the payload a contract call
/// taking the proof struct expects.
pub fn encode_contract_proof(proof: &DecodedProof) -> Vec<u8> {
    Web2JsonProof {
        merkleProof: proof
            .merkle_proof
            .iter()
            .map(|h| B256::from(*h.as_bytes()))
            .collect(),
        data: Web2JsonResponse::from(&proof.data),
    }
    .abi_encode()
}

/// Inverse of [`encode_contract_proof`].
pub fn decode_contract_proof(bytes: &[u8]) -> Result<DecodedProof, CodecError> {
    let decoded =
        Web2JsonProof::abi_decode(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    Ok(DecodedProof {
        merkle_proof: decoded
            .merkleProof
            .into_iter()
            .map(|h| Bytes32::new(h.0))
            .collect(),
        data: decoded.data.into(),
    })
}
