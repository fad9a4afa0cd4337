mod extract;
mod router;
mod state;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

pub use extract::{Caller, JsonBody, QueryArgs};
pub use router::build_router;
pub use state::{HealthSnapshot, ServeHealth, ServePhase, ServeState};

/// Serves `app` until ctrl-c, then drains in-flight requests.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    health: Arc<ServeHealth>,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "uPhone server listening");
    }
    health.enter(ServePhase::Serving);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(health))
        .await
}

async fn shutdown_signal(health: Arc<ServeHealth>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    health.enter(ServePhase::Draining);
    info!("shutdown signal received, draining");
}
