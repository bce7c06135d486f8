//! Notification dispatcher.
//!
//! Consumes notification candidates in order, applies the mute window and
//! per-classification debounce, records photos for the control server,
//! enriches, and delivers to ntfy. Nothing here is retried; failures are
//! logged and the next candidate is processed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use dmon_models::{Notification, ObjectNotification, PhotoRecord};

use crate::config::{EnrichmentConfig, NotifierConfig};
use crate::enrichment::Enricher;
use crate::error::{NotifierError, NotifierResult};
use crate::image_cc::write_image_copy;
use crate::metrics;
use crate::mute::MuteState;
use crate::ntfy;
use crate::photo_cache::PhotoCache;

/// Why an object notification was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppression {
    Muted { until: DateTime<Utc> },
    Debounced,
}

impl Suppression {
    pub fn reason(&self) -> &'static str {
        match self {
            Suppression::Muted { .. } => "muted",
            Suppression::Debounced => "debounced",
        }
    }
}

/// Result of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Suppressed(Suppression),
    Failed,
}

/// The notification dispatcher.
pub struct Notifier {
    config: NotifierConfig,
    client: Client,
    mute: MuteState,
    photos: PhotoCache,
    enricher: Enricher,
    /// Timestamp of the last non-suppressed candidate per classification
    last_sent: HashMap<String, DateTime<Utc>>,
}

impl Notifier {
    pub fn new(
        config: NotifierConfig,
        enrichment: EnrichmentConfig,
        mute: MuteState,
        photos: PhotoCache,
    ) -> NotifierResult<Self> {
        let client = Client::builder().timeout(config.req_timeout()).build()?;
        let enricher = Enricher::new(enrichment)?;
        Ok(Self {
            config,
            client,
            mute,
            photos,
            enricher,
            last_sent: HashMap::new(),
        })
    }

    /// Run until the candidate channel closes.
    pub async fn run(mut self, mut rx: UnboundedReceiver<Notification>) {
        info!(topic = %self.config.topic, "starting notifier");
        while let Some(notification) = rx.recv().await {
            self.handle(notification).await;
        }
        info!("notification stream ended; notifier stopping");
    }

    /// Process one candidate.
    pub async fn handle(&mut self, notification: Notification) -> DispatchOutcome {
        debug!(message = %notification.message(), "received notification");

        let outcome = match notification {
            Notification::Object(n) => self.handle_object(n).await,
            Notification::Feedback(n) => self.send(&n.into()).await,
        };

        let pruned = self.photos.prune_expired().await;
        if pruned > 0 {
            debug!(pruned, "pruned expired photos");
        }
        outcome
    }

    async fn handle_object(&mut self, n: ObjectNotification) -> DispatchOutcome {
        if let (Some(dir), Some(jpeg)) = (&self.config.images_cc_dir, &n.jpeg_image) {
            match write_image_copy(dir, jpeg).await {
                Ok(path) => debug!(path = %path.display(), "wrote image copy"),
                Err(e) => error!(dir = %dir.display(), error = %e, "error writing image copy"),
            }
        }

        if let Some(suppression) = self.suppression(&n).await {
            match suppression {
                Suppression::Muted { until } => {
                    info!(title = %n.title(), mute_until = %until, "notification suppressed by mute")
                }
                Suppression::Debounced => {
                    info!(title = %n.title(), "notification suppressed by debounce")
                }
            }
            metrics::record_notification_suppressed(suppression.reason());
            return DispatchOutcome::Suppressed(suppression);
        }

        self.photos
            .insert(PhotoRecord::new(n.id.clone(), n.t, n.jpeg_image.clone()))
            .await;

        let n = match self.enricher.enrich(&n).await {
            Some(desc) => n.with_enrichment(desc),
            None => n,
        };
        self.send(&n.into()).await
    }

    /// Mute, then debounce. A candidate that passes becomes the new
    /// debounce reference for its classification.
    pub async fn suppression(&mut self, n: &ObjectNotification) -> Option<Suppression> {
        if let Some(until) = self.mute.muted_until_at(n.t).await {
            return Some(Suppression::Muted { until });
        }

        if let Some(last) = self.last_sent.get(&n.classification) {
            if n.t - *last < self.config.debounce_threshold() {
                return Some(Suppression::Debounced);
            }
        }

        self.last_sent.insert(n.classification.clone(), n.t);
        None
    }

    async fn send(&self, notification: &Notification) -> DispatchOutcome {
        let kind = match notification {
            Notification::Object(_) => "object",
            Notification::Feedback(_) => "feedback",
        };
        match self.deliver(notification).await {
            Ok(()) => {
                info!(message = %notification.message(), "notification sent");
                metrics::record_notification_sent(kind);
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!(message = %notification.message(), error = %e, "error sending notification");
                metrics::record_notification_failed(kind);
                DispatchOutcome::Failed
            }
        }
    }

    /// POST the notification to the ntfy topic.
    pub async fn deliver(&self, notification: &Notification) -> NotifierResult<()> {
        let mut request = self
            .client
            .post(self.config.topic_url())
            .body(notification.message());
        for (name, value) in ntfy::headers(&self.config, notification) {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::delivery(format!(
                "ntfy returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
