//! Graceful shutdown.
//!
//! Listens for SIGINT/SIGTERM and cancels a [`CancellationToken`] that every
//! subsystem (HTTP server, sweepers, background attestations) derives from.

use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Wait for SIGTERM or SIGINT, then cancel `token`.
pub async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
        _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        _ = token.cancelled() => {}
    }

    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_when_cancelled_programmatically() {
        let token = CancellationToken::new();
        let child = token.child_token();
        token.cancel();
        cancel_on_signal(token).await;
        assert!(child.is_cancelled());
    }
}
