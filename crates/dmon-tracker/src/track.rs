//! A track: detections believed to be the same physical object.

use chrono::{DateTime, Duration, Utc};
use image::codecs::jpeg::JpegEncoder;

use dmon_models::{BoundingBox, DetectionEvent, Frame, Vector};

use crate::error::TrackerResult;

/// JPEG quality used for notification photos.
const JPEG_QUALITY: u8 = 90;

/// An append-only sequence of detection events for one object.
///
/// A track is never empty: it is created from its first event and only grows.
/// `confirmed` and `notified` are sticky once set.
#[derive(Debug, Clone)]
pub struct Track {
    id: String,
    events: Vec<DetectionEvent>,
    best_frame: Frame,
    best_frame_coverage: f64,
    confirmed: bool,
    notified: bool,
}

impl Track {
    /// Start a new track from its first detection.
    pub fn from_event(event: DetectionEvent) -> Self {
        Self {
            id: event.id.clone(),
            best_frame: Frame::clone(&event.frame),
            best_frame_coverage: event.bbox.area(),
            confirmed: event.is_confirmed,
            notified: false,
            events: vec![event],
        }
    }

    /// Append a detection, updating the best frame and confirmation state.
    pub fn add_event(&mut self, event: DetectionEvent) {
        if event.is_confirmed {
            self.confirmed = true;
        }
        let coverage = event.bbox.area();
        if coverage > self.best_frame_coverage {
            self.best_frame = Frame::clone(&event.frame);
            self.best_frame_coverage = coverage;
        }
        self.events.push(event);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn is_notified(&self) -> bool {
        self.notified
    }

    pub(crate) fn mark_notified(&mut self) {
        self.notified = true;
    }

    pub fn best_frame(&self) -> &Frame {
        &self.best_frame
    }


    fn first(&self) -> &DetectionEvent {
        &self.events[0]
    }

    fn last(&self) -> &DetectionEvent {
        &self.events[self.events.len() - 1]
    }

    pub fn first_t(&self) -> DateTime<Utc> {
        self.first().t
    }

    pub fn last_t(&self) -> DateTime<Utc> {
        self.last().t
    }

    pub fn first_box(&self) -> BoundingBox {
        self.first().bbox
    }

    pub fn last_box(&self) -> BoundingBox {
        self.last().bbox
    }

    pub fn average_box(&self) -> BoundingBox {
        BoundingBox::average_of(self.events.iter().map(|e| &e.bbox))
            .unwrap_or_else(|| self.first_box())
    }

    pub fn total_box(&self) -> BoundingBox {
        BoundingBox::enclosing(self.events.iter().map(|e| &e.bbox))
            .unwrap_or_else(|| self.first_box())
    }

    /// Average of the last two boxes; the only box if there is just one.
    pub fn last_two_box_avg(&self) -> BoundingBox {
        match self.events.len() {
            0 | 1 => self.last_box(),
            n => self.events[n - 2].bbox.average_with(&self.last_box()),
        }
    }

    /// Most common classification; ties go to the label seen first.
    pub fn classification(&self) -> &str {
        let mut votes: Vec<(&str, usize)> = Vec::new();
        for event in &self.events {
            let label = event.classification.as_str();
            match votes.iter_mut().find(|(seen, _)| *seen == label) {
                Some((_, count)) => *count += 1,
                None => votes.push((label, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (label, count) in votes {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label).unwrap_or_default()
    }

    /// Time between the first and last detection.
    pub fn length_t(&self) -> Duration {
        self.last_t() - self.first_t()
    }

    /// Vector from the first box's center to the last box's center.
    pub fn movement_vector(&self) -> Vector {
        self.first_box().center().vector_to(&self.last_box().center())
    }

    /// Encode the best frame seen so far as JPEG.
    pub fn best_frame_jpeg(&self) -> TrackerResult<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            encoder.encode_image(self.best_frame.as_ref())?;
        }
        Ok(buf)
    }
}
