//! Detection events emitted by the object detector.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use uuid::Uuid;

use crate::geometry::BoundingBox;

/// A decoded video frame. Shared between every detection made on that frame.
pub type Frame = Arc<RgbImage>;

/// Generate a new random identifier for events and tracks.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// One object observation in one processed frame.
///
/// Events are immutable once created; the tracker only ever reads them.
#[derive(Debug, Clone)]
pub struct DetectionEvent {
    /// Unique id of this event
    pub id: String,
    /// When the frame was captured
    pub t: DateTime<Utc>,
    /// Per-object continuity id assigned by the detector
    pub model_id: i64,
    /// Classification label (e.g. "car", "person")
    pub classification: String,
    /// Whether the detector considers this an established track
    pub is_confirmed: bool,
    /// Bounding box in normalized frame space
    pub bbox: BoundingBox,
    /// The frame the detection was made on
    pub frame: Frame,
}

impl DetectionEvent {
    /// Create a new detection event with a freshly generated id.
    pub fn new(
        t: DateTime<Utc>,
        model_id: i64,
        classification: impl Into<String>,
        is_confirmed: bool,
        bbox: BoundingBox,
        frame: Frame,
    ) -> Self {
        Self {
            id: new_id(),
            t,
            model_id,
            classification: classification.into(),
            is_confirmed,
            bbox,
            frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_ids_are_unique() {
        let frame: Frame = Arc::new(RgbImage::new(4, 4));
        let bbox = BoundingBox::from_corners(0.1, 0.1, 0.2, 0.2);
        let a = DetectionEvent::new(Utc::now(), 1, "car", true, bbox, Arc::clone(&frame));
        let b = DetectionEvent::new(Utc::now(), 1, "car", true, bbox, frame);

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 32);
        assert_eq!(a.classification, "car");
    }
}
