//! Tracker metrics.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const TRACKS_CREATED_TOTAL: &str = "dmon_tracks_created_total";
    pub const NOTIFICATIONS_TRIGGERED_TOTAL: &str = "dmon_notifications_triggered_total";
}

pub fn record_track_created(classification: &str) {
    let labels = [("classification", classification.to_string())];
    counter!(names::TRACKS_CREATED_TOTAL, &labels).increment(1);
}

pub fn record_notification_triggered(classification: &str) {
    let labels = [("classification", classification.to_string())];
    counter!(names::NOTIFICATIONS_TRIGGERED_TOTAL, &labels).increment(1);
}
