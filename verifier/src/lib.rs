//! Client for the off-chain verifier.
//!
//! The verifier fetches the target URL itself, applies the post-processing
//! filter, packs the result per the ABI signature and hands back the encoded
//! request bytes that are later submitted on-chain.
//!
//! Contract:
//! `POST {base}/verifier/web2/Web2Json/prepareRequest` with
//! `{attestationType, sourceId, requestBody}` → `{status, abiEncodedRequest}`.

pub mod client;
pub mod error;
pub mod types;

pub use client::{VerifierApi, VerifierClient};
pub use error::VerifierError;
pub use types::{PrepareRequest, PrepareResponse};
