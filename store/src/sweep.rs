//! Background eviction of old terminal records.

use std::sync::Arc;
use std::time::Duration;

use attestor_types::Clock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::StatusStore;

/// Every `interval`, drop terminal records untouched for longer than `retention`.
///
/// Runs until `cancel` fires.
pub fn spawn_retention_sweeper(
    store: Arc<dyn StatusStore>,
    clock: Arc<dyn Clock>,
    retention: Duration,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it so a fresh process
        // does not sweep before anything could have aged.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("status retention sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let cutoff = clock.now().before(retention);
                    match store.evict_terminal_before(cutoff) {
                        Ok(0) => {}
                        Ok(n) => tracing::info!(evicted = n, "evicted finished attestation records"),
                        Err(e) => tracing::warn!("status retention sweep failed: {e}"),
                    }
                }
            }
        }
    })
}
