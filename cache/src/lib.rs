//! Cache proxy for pre-fetched third-party data.
//!
//! Some sources (notably code-hosting APIs) are too slow or unreachable for
//! the verifier's own fetch timeout. The engine fetches them itself, keeps
//! only the fields the post-processing filter reads, and republishes that
//! minimal JSON under an unguessable key at a URL the verifier can reach.
//!
//! Security rests entirely on key unguessability (128 random bits) and the
//! short retention window; there is no authentication.

pub mod error;
pub mod prefetch;
pub mod proxy;
pub mod sweep;

pub use error::CacheError;
pub use prefetch::{minimise, Prefetcher};
pub use proxy::{CacheProxy, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};
pub use sweep::spawn_cache_sweeper;
