//! Fundamental types for the attestation engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! attestation ids, lifecycle phases, status records, decoded proofs, the fixed
//! 32-byte protocol tags, and the clock abstraction.

pub mod bytes32;
pub mod error;
pub mod id;
pub mod phase;
pub mod proof;
pub mod status;
pub mod time;

pub use bytes32::{Bytes32, ATTESTATION_TYPE_WEB2_JSON, SOURCE_ID_PUBLIC_WEB2};
pub use error::{ErrorKind, TypesError};
pub use id::AttestationId;
pub use phase::Phase;
pub use proof::{AttestationResponse, DecodedProof, RequestBody, ResponseBody};
pub use status::AttestationStatus;
pub use time::{Clock, SystemClock, Timestamp};
