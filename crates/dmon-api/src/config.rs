//! Control server configuration.

use std::net::SocketAddr;

use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Control server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub port: u16,
    pub bind_to: String,
    /// Base URL the server is reachable at from notification clients
    pub external_base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 5550,
            bind_to: "0.0.0.0".to_string(),
            external_base_url: "http://localhost:5550".to_string(),
        }
    }
}

impl WebConfig {
    /// Address to bind. `*` means all interfaces.
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        let host = match self.bind_to.trim() {
            "" | "*" => "0.0.0.0",
            host => host,
        };
        format!("{}:{}", host, self.port)
            .parse()
            .map_err(|e| ApiError::internal(format!("invalid bind address '{}': {}", host, e)))
    }
}
