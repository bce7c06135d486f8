//! Shared data models for driveway-monitor.
//!
//! This crate provides:
//! - Geometry primitives over the normalized (0.0 to 1.0) frame space
//! - Detection events as emitted by the object detector
//! - Notification candidates (object sightings and mute feedback)
//! - Photo records served by the control server

pub mod detection;
pub mod geometry;
pub mod notification;
pub mod photo;

// Re-export common types
pub use detection::{new_id, DetectionEvent, Frame};
pub use geometry::{BoundingBox, Point, Vector};
pub use notification::{
    capitalize, FeedbackNotification, FeedbackType, Notification, ObjectNotification,
};
pub use photo::{PhotoRecord, PHOTO_RETENTION_HOURS};
