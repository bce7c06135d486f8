//! Photo records retained for the control server.

use chrono::{DateTime, Duration, Utc};

/// How long a notification's photo stays retrievable.
pub const PHOTO_RETENTION_HOURS: i64 = 24;

/// A cached notification photo, keyed by notification id.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub jpeg_image: Option<Vec<u8>>,
}

impl PhotoRecord {
    /// Create a record that expires one retention period after `created_at`.
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>, jpeg_image: Option<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            expires_at: created_at + Duration::hours(PHOTO_RETENTION_HOURS),
            jpeg_image,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
