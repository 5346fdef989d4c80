//! Application orchestrator — wires server state, the HTTP router and
//! the orphan reaper together.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use landrop_server::{AppState, ServerOptions, router};
use landrop_transfer::TempStore;

use crate::config::Config;

/// Runs the server until shutdown is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let options = ServerOptions {
        name: config.name.clone(),
        storage_root: config.storage_root(),
        chunk_size: config.chunk_size_bytes(),
        max_upload_size: config.max_upload_bytes(),
    };
    let state = Arc::new(AppState::new(options)?);
    tracing::info!(root = %state.root.display(), "storage root ready");

    // -- Orphan reaper --
    let max_age = Duration::from_secs(config.temp_max_age_hours.max(1) * 3600);
    spawn_reaper(state.store.clone(), max_age, cancel.clone());

    // -- HTTP server --
    let app = router(Arc::clone(&state));
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.listen_addr, config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_cancel.cancel();
        })
        .await?;

    Ok(())
}

/// Periodically deletes temp files older than `max_age`.
///
/// A stopped-in-the-middle upload leaves its temp file behind with no
/// server-side signal; age is the only thing that identifies it.
fn spawn_reaper(store: TempStore, max_age: Duration, cancel: CancellationToken) {
    let period = (max_age / 4).max(Duration::from_secs(60));
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    let sweep_store = store.clone();
                    let result =
                        tokio::task::spawn_blocking(move || sweep_store.sweep(max_age)).await;
                    match result {
                        Ok(Ok(0)) => {}
                        Ok(Ok(removed)) => {
                            tracing::info!(removed, "reaped orphaned temp files");
                        }
                        Ok(Err(e)) => tracing::warn!(error = %e, "temp sweep failed"),
                        Err(e) => tracing::warn!(error = %e, "temp sweep task failed"),
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
}
