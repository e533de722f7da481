//! On-chain side of the attestation protocol.
//!
//! Three contracts are involved:
//! - the **registry**, which maps well-known names to current addresses
//!   (the hub and relay can be redeployed, so their addresses are never
//!   hardcoded);
//! - the **request hub**, which accepts encoded requests against a fee;
//! - the **relay**, which maps timestamps to voting rounds and reports
//!   whether a round's result is finalized.

pub mod client;
pub mod contracts;
pub mod error;

pub use client::{AttestationChain, ChainSettings, RpcChain, Submission};
pub use error::ChainError;
