//! Decoded attestation proofs.
//!
//! These mirror the `Web2Json` response struct the downstream verifier
//! contract checks, in a serde-friendly form (camelCase keys, hex byte
//! strings) so a proof can be handed to a contract-call builder as JSON.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Bytes32;

/// The request that was attested, echoed back inside the response.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    pub url: String,
    pub http_method: String,
    pub headers: String,
    pub query_params: String,
    pub body: String,
    pub post_process_jq: String,
    pub abi_signature: String,
}

/// The attested result: the filtered source data packed per the request's ABI signature.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(with = "hex_bytes")]
    pub abi_encoded_data: Vec<u8>,
}

/// The full attestation response committed to by the round's Merkle root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationResponse {
    pub attestation_type: Bytes32,
    pub source_id: Bytes32,
    pub voting_round: u64,
    pub lowest_used_timestamp: u64,
    pub request_body: RequestBody,
    pub response_body: ResponseBody,
}

/// A response paired with its Merkle inclusion path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedProof {
    /// Sibling hashes from leaf to root. May be empty for a single-leaf round.
    pub merkle_proof: Vec<Bytes32>,
    pub data: AttestationResponse,
}

mod hex_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
