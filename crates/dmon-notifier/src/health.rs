//! Liveness pings to an external health check (e.g. Uptime Kuma, healthchecks.io).

use reqwest::Client;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};

use crate::config::HealthPingerConfig;
use crate::error::NotifierResult;
use crate::metrics;

/// Request to ping a health check URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthPing {
    pub url: String,
}

impl HealthPing {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Performs `GET` requests for each received ping.
pub struct HealthPinger {
    client: Client,
}

impl HealthPinger {
    pub fn new(config: &HealthPingerConfig) -> NotifierResult<Self> {
        let client = Client::builder().timeout(config.req_timeout).build()?;
        Ok(Self { client })
    }

    pub async fn ping(&self, ping: &HealthPing) -> NotifierResult<()> {
        debug!(url = %ping.url, "pinging health check");
        self.client
            .get(&ping.url)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Run until the ping channel closes. Failures are logged only.
    pub async fn run(self, mut rx: UnboundedReceiver<HealthPing>) {
        info!("starting health pinger");
        while let Some(ping) = rx.recv().await {
            if let Err(e) = self.ping(&ping).await {
                error!(url = %ping.url, error = %e, "error pinging health check");
                metrics::record_health_ping_failed();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_run_pings_each_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping/abc"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let pinger = HealthPinger::new(&HealthPingerConfig::default()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let url = format!("{}/ping/abc", server.uri());
        tx.send(HealthPing::new(url.clone())).unwrap();
        tx.send(HealthPing::new(url)).unwrap();
        drop(tx);

        pinger.run(rx).await;
    }

    #[tokio::test]
    async fn test_ping_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let pinger = HealthPinger::new(&HealthPingerConfig {
            req_timeout: Duration::from_secs(1),
        })
        .unwrap();
        assert!(pinger.ping(&HealthPing::new(server.uri())).await.is_err());
    }
}
