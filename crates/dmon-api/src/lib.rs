//! Control and status server.
//!
//! This crate provides:
//! - `GET /health` for liveness checks
//! - `POST /mute` to mute or unmute notifications (used by ntfy action buttons)
//! - `GET /photo/{id}.jpg` serving cached notification photos
//! - Prometheus metrics at `/metrics`

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::WebConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
