//! In-memory status store.

use std::collections::HashMap;
use std::sync::RwLock;

use attestor_types::{AttestationId, AttestationStatus, Timestamp, TypesError};

use crate::{StatusStore, StoreError};

/// A `RwLock<HashMap>` backed store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStatusStore {
    records: RwLock<HashMap<AttestationId, AttestationStatus>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("status map lock poisoned".into())
}

impl StatusStore for MemoryStatusStore {
    fn insert(&self, status: AttestationStatus) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(status.id()) {
            return Err(StoreError::Duplicate(status.id().to_string()));
        }
        records.insert(status.id().clone(), status);
        Ok(())
    }

    fn get(&self, id: &AttestationId) -> Result<AttestationStatus, StoreError> {
        self.records
            .read()
            .map_err(poisoned)?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn update(
        &self,
        id: &AttestationId,
        f: &mut dyn FnMut(&mut AttestationStatus) -> Result<(), TypesError>,
    ) -> Result<AttestationStatus, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let current = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut next = current.clone();
        f(&mut next)?;
        *current = next.clone();
        Ok(next)
    }

    fn list(&self) -> Result<Vec<AttestationStatus>, StoreError> {
        let mut all: Vec<_> = self.records.read().map_err(poisoned)?.values().cloned().collect();
        all.sort_by_key(|s| (s.created_at(), s.id().clone()));
        Ok(all)
    }

    fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    fn evict_terminal_before(&self, cutoff: Timestamp) -> Result<usize, StoreError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let before = records.len();
        records.retain(|_, s| !(s.phase().is_terminal() && s.updated_at() < cutoff));
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor_types::{ErrorKind, Phase};
    use std::sync::Arc;

    fn record(created: u64) -> AttestationStatus {
        AttestationStatus::new(AttestationId::generate().unwrap(), Timestamp::new(created))
    }

    #[test]
    fn insert_then_get() {
        let store = MemoryStatusStore::new();
        let status = record(10);
        let id = status.id().clone();
        store.insert(status.clone()).unwrap();
        assert_eq!(store.get(&id).unwrap(), status);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let store = MemoryStatusStore::new();
        let status = record(10);
        store.insert(status.clone()).unwrap();
        assert!(matches!(store.insert(status), Err(StoreError::Duplicate(_))));
    }

    #[test]
    fn missing_id_is_not_found() {
        let store = MemoryStatusStore::new();
        let id = AttestationId::generate().unwrap();
        assert!(matches!(store.get(&id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn rejected_update_leaves_record_untouched() {
        let store = MemoryStatusStore::new();
        let status = record(10);
        let id = status.id().clone();
        store.insert(status).unwrap();

        // preparing -> finalized is not a legal step
        let result = store.update(&id, &mut |s| s.mark_finalized(Timestamp::new(11)));
        assert!(matches!(result, Err(StoreError::Transition(_))));
        assert_eq!(store.get(&id).unwrap().phase(), Phase::Preparing);
    }

    #[test]
    fn update_persists() {
        let store = MemoryStatusStore::new();
        let status = record(10);
        let id = status.id().clone();
        store.insert(status).unwrap();
        let updated = store
            .update(&id, &mut |s| s.mark_submitted(5, "0xfeed", Timestamp::new(12)))
            .unwrap();
        assert_eq!(updated.voting_round(), Some(5));
        assert_eq!(store.get(&id).unwrap().voting_round(), Some(5));
    }

    #[test]
    fn eviction_spares_in_flight_records() {
        let store = MemoryStatusStore::new();
        let in_flight = record(1);
        let mut failed = record(1);
        failed
            .mark_failed(ErrorKind::Timeout, "gave up", Timestamp::new(2))
            .unwrap();
        let mut recent_failure = record(1);
        recent_failure
            .mark_failed(ErrorKind::Timeout, "gave up", Timestamp::new(500))
            .unwrap();
        let in_flight_id = in_flight.id().clone();
        let recent_id = recent_failure.id().clone();
        store.insert(in_flight).unwrap();
        store.insert(failed).unwrap();
        store.insert(recent_failure).unwrap();

        let evicted = store.evict_terminal_before(Timestamp::new(100)).unwrap();
        assert_eq!(evicted, 1);
        assert!(store.get(&in_flight_id).is_ok());
        assert!(store.get(&recent_id).is_ok());
    }

    #[test]
    fn list_is_ordered_by_creation() {
        let store = MemoryStatusStore::new();
        for t in [30, 10, 20] {
            store.insert(record(t)).unwrap();
        }
        let created: Vec<u64> = store
            .list()
            .unwrap()
            .iter()
            .map(|s| s.created_at().as_secs())
            .collect();
        assert_eq!(created, vec![10, 20, 30]);
    }

    #[test]
    fn concurrent_inserts_from_many_threads() {
        let store = Arc::new(MemoryStatusStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.insert(record(1)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
