//! Server startup.

use std::future::Future;

use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use crate::config::WebConfig;
use crate::error::{ApiError, ApiResult};
use crate::routes::create_router;
use crate::state::AppState;

/// Bind and serve until `shutdown` resolves.
pub async fn serve<F>(
    config: &WebConfig,
    state: AppState,
    metrics_handle: Option<PrometheusHandle>,
    shutdown: F,
) -> ApiResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;
    let app = create_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal(format!("failed to bind {}: {}", addr, e)))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::internal(format!("server error: {}", e)))?;

    info!("Server shutdown complete");
    Ok(())
}
