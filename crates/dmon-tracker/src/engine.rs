//! Track association engine.
//!
//! Consumes detection events strictly in arrival order, extends or creates
//! tracks, prunes stale ones, and raises one notification per track the
//! first time it meets the notification criteria. All timing decisions use
//! event timestamps, so a fixed input sequence always produces the same
//! tracks.

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use dmon_models::{DetectionEvent, Notification, ObjectNotification};

use crate::config::TrackerConfig;
use crate::criteria::NotificationCriteria;
use crate::metrics;
use crate::track::Track;

/// Event phrase attached to object notifications.
pub const ARRIVAL_EVENT: &str = "arrived in driveway";

/// Overlap requirement multiplier when classifications disagree.
const CLASS_MISMATCH_OVERLAP_FACTOR: f64 = 1.5;

/// The association engine. Owns every live track.
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    criteria: NotificationCriteria,
    tracks: Vec<Track>,
}

impl Tracker {
    pub fn new(config: TrackerConfig, criteria: NotificationCriteria) -> Self {
        Self {
            config,
            criteria,
            tracks: Vec::new(),
        }
    }

    /// Live tracks, in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Process one detection. Returns a notification if this event made its
    /// track meet the criteria for the first time.
    pub fn process(&mut self, event: DetectionEvent) -> Option<ObjectNotification> {
        debug!(
            event_id = %event.id,
            classification = %event.classification,
            t = %event.t,
            "received detection"
        );

        self.prune(&event);

        let idx = match self.best_match(&event) {
            Some(idx) => {
                debug!(
                    event_id = %event.id,
                    track_id = %self.tracks[idx].id(),
                    "adding detection to existing track"
                );
                self.tracks[idx].add_event(event);
                idx
            }
            None => {
                debug!(event_id = %event.id, classification = %event.classification, "creating new track");
                metrics::record_track_created(&event.classification);
                self.tracks.push(Track::from_event(event));
                self.tracks.len() - 1
            }
        };

        let track = &mut self.tracks[idx];
        if !track.is_confirmed() {
            debug!(track_id = %track.id(), "not confirmed yet");
            return None;
        }
        if track.is_notified() {
            debug!(track_id = %track.id(), "already notified");
            return None;
        }
        let decision = self.criteria.evaluate(track);
        if !decision.is_pass() {
            debug!(track_id = %track.id(), decision = decision.as_str(), "criteria not met");
            return None;
        }

        track.mark_notified();
        let classification = track.classification().to_string();
        info!(
            track_id = %track.id(),
            classification = %classification,
            "track met notification criteria"
        );
        metrics::record_notification_triggered(&classification);

        let jpeg = match track.best_frame_jpeg() {
            Ok(jpeg) => Some(jpeg),
            Err(e) => {
                warn!(track_id = %track.id(), error = %e, "failed to encode best frame; notifying without image");
                None
            }
        };

        Some(ObjectNotification::new(
            track.first_t(),
            classification,
            ARRIVAL_EVENT,
            track.id(),
            jpeg,
        ))
    }

    /// Drop tracks whose last detection is too old relative to `event`.
    fn prune(&mut self, event: &DetectionEvent) {
        let max_age = self.config.inactive_track_prune();
        let before = self.tracks.len();
        self.tracks.retain(|track| event.t - track.last_t() < max_age);
        let pruned = before - self.tracks.len();
        if pruned > 0 {
            debug!(pruned, remaining = self.tracks.len(), "pruned inactive tracks");
        }
    }

    /// Index of the live track with the strictly greatest qualifying overlap.
    fn best_match(&self, event: &DetectionEvent) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, track) in self.tracks.iter().enumerate() {
            let mut needed = self.config.track_connect_min_overlap;
            if track.classification() != event.classification {
                needed *= CLASS_MISMATCH_OVERLAP_FACTOR;
            }
            let overlap = track.last_two_box_avg().percent_intersection_with(&event.bbox);
            if overlap > needed && best.map_or(true, |(_, best_overlap)| overlap > best_overlap) {
                best = Some((idx, overlap));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Run until the detection stream ends or the notification channel closes.
    pub async fn run(
        mut self,
        mut rx: UnboundedReceiver<DetectionEvent>,
        tx: UnboundedSender<Notification>,
    ) {
        info!("starting tracker");
        while let Some(event) = rx.recv().await {
            if let Some(notification) = self.process(event) {
                if tx.send(notification.into()).is_err() {
                    warn!("notification channel closed; stopping tracker");
                    return;
                }
            }
        }
        info!("detection stream ended; tracker stopping");
    }
}
