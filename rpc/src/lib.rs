//! HTTP server for the attestation engine.
//!
//! Provides endpoints for:
//! - Cache proxy reads (`GET /cache/{key}`), consumed by the verifier
//! - Attestation status (`GET /attestations`, `GET /attestations/{id}`)
//! - Starting an attestation (`POST /attestations`)
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, AppState, RpcServer};
