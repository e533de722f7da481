//! Data-availability (DA) client.
//!
//! Once a voting round is finalized, the DA service serves the Merkle proof
//! for every request included in it. Requests are looked up by round and by
//! the request bytes themselves, and deployments disagree on how those bytes
//! should be spelled, so callers try several [`RequestEncoding`]s in order.

pub mod client;
pub mod encoding;
pub mod error;

pub use client::{DaApi, DaClient, RawProof, PROOF_PATH};
pub use encoding::{RequestEncoding, DEFAULT_ENCODINGS};
pub use error::DaError;
