//! The attestation pipeline.
//!
//! An attestation moves through four stages, each behind its own trait so
//! any of them can be swapped out:
//!
//! 1. [`RequestPreparer`]: the verifier turns a source description into an
//!    encoded request.
//! 2. [`Submitter`]: the request goes on-chain; the confirming block fixes
//!    the voting round.
//! 3. [`FinalizationWaiter`]: poll the relay until that round is finalized.
//! 4. [`ProofFetcher`]: pull the Merkle proof and response from the DA layer.
//!
//! [`Attestor`] composes them. Every stage writes its progress, and its
//! failure, to the shared [`StatusStore`](attestor_store::StatusStore)
//! before returning.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod orchestrator;
pub mod preparer;
pub mod presets;
pub mod records;
pub mod submitter;
pub mod waiter;

pub use config::{EngineConfig, SecretKey};
pub use error::{AttestationFailure, EngineError};
pub use fetcher::{DaProofFetcher, FetchPolicy, ProofFetcher};
pub use metrics::EngineMetrics;
pub use orchestrator::{AttestRequest, Attestor};
pub use preparer::{PreparedRequest, RequestPreparer, VerifierPreparer, Web2JsonSource};
pub use presets::{Preset, SourceDefinition};
pub use records::Records;
pub use submitter::{ChainSubmitter, SubmittedRequest, Submitter};
pub use waiter::{FinalizationWaiter, RelayWaiter, WaitPolicy};
