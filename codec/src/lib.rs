//! ABI encoding and decoding for attestation proofs.
//!
//! The DA layer returns the attested response as raw Solidity ABI bytes
//! (`abi.encode(Response)`), and the downstream verifier contract expects the
//! same layout back inside its `Proof` argument. The layout is fixed:
//!
//! ```text
//! Response {
//!     bytes32 attestationType;
//!     bytes32 sourceId;
//!     uint64  votingRound;
//!     uint64  lowestUsedTimestamp;
//!     RequestBody  { string url; string httpMethod; string headers;
//!                    string queryParams; string body;
//!                    string postProcessJq; string abiSignature; }
//!     ResponseBody { bytes abiEncodedData; }
//! }
//! ```

pub mod abi;
pub mod error;
pub mod hex_input;

pub use abi::{decode_contract_proof, decode_response, encode_contract_proof, encode_response};
pub use error::CodecError;
pub use hex_input::decode_hex;
