//! Tracker and notification criteria configuration.

use std::collections::HashMap;

use chrono::Duration;
use serde::Deserialize;

use crate::error::{TrackerError, TrackerResult};

/// Association engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Drop tracks that have seen no detection in this many seconds
    pub inactive_track_prune_s: f64,
    /// Minimum overlap with the average of a track's last two boxes,
    /// assuming the classification matches
    pub track_connect_min_overlap: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            inactive_track_prune_s: 1.0,
            track_connect_min_overlap: 0.2,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> TrackerResult<()> {
        if !(0.0..=1.0).contains(&self.track_connect_min_overlap) {
            return Err(TrackerError::config(
                "tracker.track_connect_min_overlap must be in [0, 1]",
            ));
        }
        if self.inactive_track_prune_s < 0.0 {
            return Err(TrackerError::config(
                "tracker.inactive_track_prune_s must not be negative",
            ));
        }
        Ok(())
    }

    pub fn inactive_track_prune(&self) -> Duration {
        secs_to_duration(self.inactive_track_prune_s)
    }
}

/// Notification criteria configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CriteriaConfig {
    /// Only notify for these classifications
    pub classification_allowlist: Option<Vec<String>>,
    /// Never notify for these classifications
    pub classification_blocklist: Option<Vec<String>>,
    /// Minimum track duration, in seconds
    pub min_track_length_s: f64,
    /// Per-classification overrides of `min_track_length_s`
    pub min_track_length_s_per_classification: HashMap<String, f64>,
    /// Optional CEL expression over `track`
    pub track_cel: Option<String>,
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        Self {
            classification_allowlist: None,
            classification_blocklist: None,
            min_track_length_s: 1.0,
            min_track_length_s_per_classification: HashMap::new(),
            track_cel: None,
        }
    }
}

impl CriteriaConfig {
    /// Minimum track duration for a classification.
    pub fn min_track_length_for(&self, classification: &str) -> Duration {
        let secs = self
            .min_track_length_s_per_classification
            .get(classification)
            .copied()
            .unwrap_or(self.min_track_length_s);
        secs_to_duration(secs)
    }
}

/// Convert fractional seconds to a chrono duration (microsecond precision).
pub fn secs_to_duration(secs: f64) -> Duration {
    let micros = (secs * 1_000_000.0).round();
    // chrono has no `try_microseconds`; the fallible step is the f64 -> i64 conversion.
    (micros.is_nan() || (micros >= i64::MIN as f64 && micros < i64::MAX as f64))
        .then(|| Duration::microseconds(micros as i64))
        .unwrap_or(if secs < 0.0 {
            Duration::MIN
        } else {
            Duration::MAX
        })
}
