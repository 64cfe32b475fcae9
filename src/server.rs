//! Listener lifecycle.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::caps::spawn_caps_report;
use crate::config::Config;
use crate::metrics::EndpointMetrics;

/// Serve the API on `listener` until `shutdown` resolves.
///
/// The capability report is spawned before the server starts accepting and
/// is never awaited, so a slow or absent orchestrator cannot delay startup.
pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> crate::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics = Arc::new(EndpointMetrics::new());
    let router = create_router(AppState::with_metrics(metrics));

    let _caps_handle = spawn_caps_report(&config);

    info!(
        addr = %listener.local_addr()?,
        orchestrator = %config.orchestrator_event_url(),
        "HTTP server listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP server stopped");
    Ok(())
}
