//! Notification criteria evaluator.

use tracing::{debug, warn};

use crate::config::CriteriaConfig;
use crate::error::TrackerResult;
use crate::rule::TrackRule;
use crate::track::Track;

/// Outcome of evaluating a track against the criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriteriaDecision {
    Pass,
    NotAllowlisted,
    Blocklisted,
    TooShort,
    RuleRejected,
}

impl CriteriaDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, CriteriaDecision::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CriteriaDecision::Pass => "pass",
            CriteriaDecision::NotAllowlisted => "not_allowlisted",
            CriteriaDecision::Blocklisted => "blocklisted",
            CriteriaDecision::TooShort => "too_short",
            CriteriaDecision::RuleRejected => "rule_rejected",
        }
    }
}

/// Allowlist, blocklist, minimum duration and custom rule, checked in that order.
#[derive(Debug)]
pub struct NotificationCriteria {
    config: CriteriaConfig,
    rule: Option<TrackRule>,
}

impl NotificationCriteria {
    /// Build the evaluator, compiling the custom rule if one is configured.
    pub fn new(config: CriteriaConfig) -> TrackerResult<Self> {
        let rule = match config.track_cel.as_deref().map(str::trim) {
            Some(expr) if !expr.is_empty() => Some(TrackRule::compile(expr)?),
            _ => None,
        };
        Ok(Self { config, rule })
    }

    pub fn evaluate(&self, track: &Track) -> CriteriaDecision {
        let classification = track.classification();

        if let Some(allowlist) = &self.config.classification_allowlist {
            if !allowlist.is_empty() && !allowlist.iter().any(|c| c == classification) {
                debug!(track_id = %track.id(), classification, "not allowlisted");
                return CriteriaDecision::NotAllowlisted;
            }
        }

        if let Some(blocklist) = &self.config.classification_blocklist {
            if blocklist.iter().any(|c| c == classification) {
                debug!(track_id = %track.id(), classification, "blocklisted");
                return CriteriaDecision::Blocklisted;
            }
        }

        let min_length = self.config.min_track_length_for(classification);
        if track.length_t() < min_length {
            debug!(
                track_id = %track.id(),
                length_ms = track.length_t().num_milliseconds(),
                required_ms = min_length.num_milliseconds(),
                "track too short"
            );
            return CriteriaDecision::TooShort;
        }

        if let Some(rule) = &self.rule {
            match rule.matches(track) {
                Ok(true) => {}
                Ok(false) => {
                    debug!(track_id = %track.id(), "did not pass track rule");
                    return CriteriaDecision::RuleRejected;
                }
                Err(e) => {
                    warn!(
                        track_id = %track.id(),
                        expression = %rule.expression(),
                        error = %e,
                        "track rule evaluation failed"
                    );
                    return CriteriaDecision::RuleRejected;
                }
            }
        }

        CriteriaDecision::Pass
    }
}
