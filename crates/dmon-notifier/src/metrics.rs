//! Notifier metrics.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const NOTIFICATIONS_SENT_TOTAL: &str = "dmon_notifications_sent_total";
    pub const NOTIFICATIONS_SUPPRESSED_TOTAL: &str = "dmon_notifications_suppressed_total";
    pub const NOTIFICATIONS_FAILED_TOTAL: &str = "dmon_notifications_failed_total";
    pub const ENRICHMENT_FAILURES_TOTAL: &str = "dmon_enrichment_failures_total";
    pub const HEALTH_PINGS_FAILED_TOTAL: &str = "dmon_health_pings_failed_total";
}

pub fn record_notification_sent(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::NOTIFICATIONS_SENT_TOTAL, &labels).increment(1);
}

pub fn record_notification_suppressed(reason: &str) {
    let labels = [("reason", reason.to_string())];
    counter!(names::NOTIFICATIONS_SUPPRESSED_TOTAL, &labels).increment(1);
}

pub fn record_notification_failed(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::NOTIFICATIONS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_enrichment_failure() {
    counter!(names::ENRICHMENT_FAILURES_TOTAL).increment(1);
}

pub fn record_health_ping_failed() {
    counter!(names::HEALTH_PINGS_FAILED_TOTAL).increment(1);
}
