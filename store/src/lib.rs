//! Storage for attestation status records.
//!
//! The engine depends only on the [`StatusStore`] trait; [`MemoryStatusStore`]
//! is the process-local implementation used by the daemon and by tests.

pub mod error;
pub mod memory;
pub mod status;
pub mod sweep;

pub use error::StoreError;
pub use memory::MemoryStatusStore;
pub use status::StatusStore;
pub use sweep::spawn_retention_sweeper;
