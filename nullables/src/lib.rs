//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the engine (clock, verifier, chain, DA
//! service) sits behind a trait. This crate provides test implementations
//! that:
//! - return scripted values
//! - record what they were asked, for assertions
//! - never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod chain;
pub mod clock;
pub mod da;
pub mod verifier;

pub use chain::NullChain;
pub use clock::NullClock;
pub use da::NullDa;
pub use verifier::NullVerifier;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Test doubles keep working after a panicking test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
