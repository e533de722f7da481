//! Status store trait.

use crate::StoreError;
use attestor_types::{AttestationId, AttestationStatus, Timestamp, TypesError};

/// Id-keyed store of attestation lifecycle records.
///
/// Implementations must be safe to share between tasks. Each record is only
/// ever written by the task driving that attestation, so `update` needs no
/// cross-record coordination, but insert and lookup race freely.
pub trait StatusStore: Send + Sync {
    /// Insert a new record. Fails with [`StoreError::Duplicate`] if the id exists.
    fn insert(&self, status: AttestationStatus) -> Result<(), StoreError>;

    fn get(&self, id: &AttestationId) -> Result<AttestationStatus, StoreError>;

    /// Apply `f` to the record and persist the result.
    ///
    /// If `f` fails the stored record is left untouched.
    fn update(
        &self,
        id: &AttestationId,
        f: &mut dyn FnMut(&mut AttestationStatus) -> Result<(), TypesError>,
    ) -> Result<AttestationStatus, StoreError>;

    /// All records, oldest first.
    fn list(&self) -> Result<Vec<AttestationStatus>, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop terminal records (`proof-ready`, `failed`) last touched before
    /// `cutoff`. In-flight records are never evicted. Returns the count removed.
    fn evict_terminal_before(&self, cutoff: Timestamp) -> Result<usize, StoreError>;
}
