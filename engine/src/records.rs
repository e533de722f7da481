//! Status-record bookkeeping shared by the stages.

use std::sync::Arc;

use attestor_store::StatusStore;
use attestor_types::{AttestationId, AttestationStatus, Clock, Timestamp, TypesError};

use crate::EngineError;

/// Store plus clock: every stage mutates records through this.
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn StatusStore>,
    clock: Arc<dyn Clock>,
}

impl Records {
    pub fn new(store: Arc<dyn StatusStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Create a fresh record in `preparing` and return its id.
    pub fn open(&self) -> Result<AttestationId, EngineError> {
        let id = AttestationId::generate()?;
        self.store.insert(AttestationStatus::new(id.clone(), self.now()))?;
        tracing::debug!(attestation_id = %id, "status record created");
        Ok(id)
    }

    /// Apply a transition stamped with the current time.
    pub fn advance(
        &self,
        id: &AttestationId,
        mut transition: impl FnMut(&mut AttestationStatus, Timestamp) -> Result<(), TypesError>,
    ) -> Result<AttestationStatus, EngineError> {
        let now = self.now();
        Ok(self.store.update(id, &mut |status| transition(status, now))?)
    }

    /// Mark the record failed with `error`'s kind and message.
    ///
    /// A record that is already terminal stays as it is; the stage's error
    /// still reaches the caller.
    pub fn fail(&self, id: &AttestationId, error: &EngineError) {
        let kind = error.kind();
        let message = error.to_string();
        tracing::warn!(attestation_id = %id, kind = %kind, error = %message, "attestation failed");
        if let Err(e) = self.advance(id, |status, now| status.mark_failed(kind, message.clone(), now)) {
            tracing::warn!(attestation_id = %id, error = %e, "could not record failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor_nullables::NullClock;
    use attestor_store::MemoryStatusStore;
    use attestor_types::{ErrorKind, Phase};

    fn records() -> (Records, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(1_000));
        (
            Records::new(Arc::new(MemoryStatusStore::new()), clock.clone()),
            clock,
        )
    }

    #[test]
    fn open_creates_preparing_record() {
        let (records, _) = records();
        let id = records.open().unwrap();
        let status = records.store().get(&id).unwrap();
        assert_eq!(status.phase(), Phase::Preparing);
        assert_eq!(status.created_at().as_secs(), 1_000);
    }

    #[test]
    fn ids_are_unique() {
        let (records, _) = records();
        let a = records.open().unwrap();
        let b = records.open().unwrap();
        assert_ne!(a, b);
        assert_eq!(records.store().len(), 2);
    }

    #[test]
    fn fail_records_kind_and_message() {
        let (records, clock) = records();
        let id = records.open().unwrap();
        clock.advance(5);
        records.fail(&id, &EngineError::Config("missing".into()));
        let status = records.store().get(&id).unwrap();
        assert_eq!(status.phase(), Phase::Failed);
        assert_eq!(status.error_kind(), Some(ErrorKind::Configuration));
        assert_eq!(status.error(), Some("configuration error: missing"));
        assert_eq!(status.updated_at().as_secs(), 1_005);
    }

    #[test]
    fn failing_twice_keeps_first_cause() {
        let (records, _) = records();
        let id = records.open().unwrap();
        records.fail(&id, &EngineError::Config("first".into()));
        records.fail(&id, &EngineError::Cancelled("waiting"));
        let status = records.store().get(&id).unwrap();
        assert_eq!(status.error_kind(), Some(ErrorKind::Configuration));
    }
}
