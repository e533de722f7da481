//! The key-addressed store behind the cache endpoint.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use attestor_types::{Clock, Timestamp};

use crate::CacheError;

/// How long an entry stays readable. Must exceed the verifier's worst-case
/// time to consume it.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// How often expired entries are physically removed.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

struct CacheEntry {
    /// Serialized JSON, served byte-for-byte.
    data: String,
    created_at: Timestamp,
}

/// Short-lived store of JSON payloads keyed by random 128-bit hex keys.
///
/// Written by the engine, read concurrently by the HTTP handler that serves
/// the verifier, and pruned by the background sweeper.
pub struct CacheProxy {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl CacheProxy {
    pub fn new(clock: Arc<dyn Clock>, retention: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            retention,
        }
    }

    /// Serialize `data` once and store it. Returns the key.
    pub fn put(&self, data: &serde_json::Value) -> Result<String, CacheError> {
        let json =
            serde_json::to_string(data).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.put_raw(json)
    }

    /// Store an already-serialized JSON document verbatim.
    pub fn put_raw(&self, json: String) -> Result<String, CacheError> {
        let key = generate_key()?;
        let entry = CacheEntry {
            data: json,
            created_at: self.clock.now(),
        };
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.clone(), entry);
        tracing::debug!(key = %key, entries = entries.len(), "cached payload");
        Ok(key)
    }

    /// Fetch the stored JSON exactly as it was put. Entries past retention
    /// read as [`CacheError::NotFound`] even if the sweep has not run yet.
    pub fn get(&self, key: &str) -> Result<String, CacheError> {
        let entries = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        let entry = entries.get(key).ok_or(CacheError::NotFound)?;
        if entry
            .created_at
            .has_expired(self.retention, self.clock.now())
        {
            return Err(CacheError::NotFound);
        }
        Ok(entry.data.clone())
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn sweep(&self) -> Result<usize, CacheError> {
        let now = self.clock.now();
        let retention = self.retention;
        let mut entries = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        let before = entries.len();
        entries.retain(|_, e| !e.created_at.has_expired(retention, now));
        Ok(before - entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn generate_key() -> Result<String, CacheError> {
    let mut bytes = [0u8; 16];
    getrandom::getrandom(&mut bytes).map_err(|e| CacheError::Randomness(e.to_string()))?;
    Ok(hex::encode(bytes))
}
