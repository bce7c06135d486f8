//! Health check handler.

use axum::Json;
use serde::Serialize;

/// Generic status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// Liveness probe.
pub async fn health() -> Json<StatusResponse> {
    Json(StatusResponse::ok())
}
