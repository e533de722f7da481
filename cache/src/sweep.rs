//! Periodic removal of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::CacheProxy;

/// Run [`CacheProxy::sweep`] every `interval` until `cancel` fires.
pub fn spawn_cache_sweeper(
    cache: Arc<CacheProxy>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => match cache.sweep() {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(removed = n, remaining = cache.len(), "swept cache"),
                    Err(e) => tracing::warn!("cache sweep failed: {e}"),
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor_nullables::NullClock;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn sweeper_removes_expired_entries_on_tick() {
        let clock = Arc::new(NullClock::new(0));
        let cache = Arc::new(CacheProxy::new(clock.clone(), Duration::from_secs(60)));
        cache.put(&json!({"a": 1})).unwrap();
        clock.advance(61);

        let cancel = CancellationToken::new();
        let handle = spawn_cache_sweeper(cache.clone(), Duration::from_secs(600), cancel.clone());
        tokio::time::sleep(Duration::from_secs(601)).await;
        assert!(cache.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
