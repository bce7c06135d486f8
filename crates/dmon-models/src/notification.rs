//! Notification candidates flowing from the tracker to the notifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used for feedback (mute/unmute) notifications.
pub const FEEDBACK_TITLE: &str = "driveway-monitor";

/// A notification candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A tracked object met the notification criteria.
    Object(ObjectNotification),
    /// Acknowledgement of a mute/unmute command.
    Feedback(FeedbackNotification),
}

impl Notification {
    /// Human-readable message body.
    pub fn message(&self) -> String {
        match self {
            Notification::Object(n) => n.message(),
            Notification::Feedback(n) => n.message(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Notification::Object(n) => n.title(),
            Notification::Feedback(_) => FEEDBACK_TITLE.to_string(),
        }
    }

    /// Emoji tag shortcode shown next to the notification.
    pub fn tags(&self) -> &'static str {
        match self {
            Notification::Object(n) => n.tags(),
            Notification::Feedback(n) => n.kind.tags(),
        }
    }
}

impl From<ObjectNotification> for Notification {
    fn from(n: ObjectNotification) -> Self {
        Notification::Object(n)
    }
}

impl From<FeedbackNotification> for Notification {
    fn from(n: FeedbackNotification) -> Self {
        Notification::Feedback(n)
    }
}

/// A tracked object worth telling someone about.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNotification {
    /// Timestamp of the track's first detection
    pub t: DateTime<Utc>,
    pub classification: String,
    /// Event phrase, e.g. "arrived in driveway"
    pub event: String,
    /// Track id; also the photo key
    pub id: String,
    /// Best representative frame, JPEG-encoded
    pub jpeg_image: Option<Vec<u8>>,
    /// Description produced by the enrichment model
    pub enriched_description: Option<String>,
}

impl ObjectNotification {
    pub fn new(
        t: DateTime<Utc>,
        classification: impl Into<String>,
        event: impl Into<String>,
        id: impl Into<String>,
        jpeg_image: Option<Vec<u8>>,
    ) -> Self {
        Self {
            t,
            classification: classification.into(),
            event: event.into(),
            id: id.into(),
            jpeg_image,
            enriched_description: None,
        }
    }

    pub fn title(&self) -> String {
        capitalize(&format!("{} {}", self.classification, self.event))
    }

    pub fn message(&self) -> String {
        match self.enriched_description.as_deref() {
            Some(desc) if !desc.is_empty() => capitalize(&format!("Likely: {}.", desc)),
            _ => self.title(),
        }
    }

    pub fn tags(&self) -> &'static str {
        match self.classification.as_str() {
            "car" => "blue_car",
            "truck" => "truck",
            "person" => "walking",
            _ => "camera_flash",
        }
    }

    /// Copy of this notification carrying an enriched description.
    pub fn with_enrichment(&self, description: impl Into<String>) -> Self {
        Self {
            enriched_description: Some(description.into()),
            ..self.clone()
        }
    }
}

/// Kind of feedback notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Muted,
    Unmuted,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Muted => "muted",
            FeedbackType::Unmuted => "unmuted",
        }
    }

    pub fn tags(&self) -> &'static str {
        match self {
            FeedbackType::Muted => "mute",
            FeedbackType::Unmuted => "loud_sound",
        }
    }
}

/// Acknowledgement of a mute/unmute command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackNotification {
    pub kind: FeedbackType,
    /// Photo key the command was issued with
    pub key: String,
    /// Requested mute duration; `None` for unmute
    pub mute_seconds: Option<i64>,
}

impl FeedbackNotification {
    pub fn muted(key: impl Into<String>, seconds: i64) -> Self {
        Self {
            kind: FeedbackType::Muted,
            key: key.into(),
            mute_seconds: Some(seconds),
        }
    }

    pub fn unmuted(key: impl Into<String>) -> Self {
        Self {
            kind: FeedbackType::Unmuted,
            key: key.into(),
            mute_seconds: None,
        }
    }

    pub fn message(&self) -> String {
        format!("Notifications {}.", self.kind.as_str())
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
