//! Track association and notification criteria.
//!
//! This crate provides:
//! - `Track`: a sequence of detections believed to be one physical object
//! - `Tracker`: the association engine turning detections into tracks
//! - `NotificationCriteria`: the gate deciding whether a track notifies
//! - `TrackRule`: compiled CEL expressions evaluated against a track view

pub mod config;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod rule;
pub mod track;

pub use config::{CriteriaConfig, TrackerConfig};
pub use criteria::{CriteriaDecision, NotificationCriteria};
pub use engine::{Tracker, ARRIVAL_EVENT};
pub use error::{TrackerError, TrackerResult};
pub use rule::TrackRule;
pub use track::Track;
