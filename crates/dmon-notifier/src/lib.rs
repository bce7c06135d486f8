//! Notification dispatch for driveway-monitor.
//!
//! This crate provides:
//! - `Notifier`: debounce, mute and delivery of notification candidates to ntfy
//! - `MuteState` and `PhotoCache`: state shared with the control server
//! - `Enricher`: best-effort image descriptions from Ollama or OpenAI-compatible models
//! - `HealthPinger`: liveness pings to an external health check
//! - `print_notifier`: a stdout-only consumer for local testing

pub mod config;
pub mod dispatcher;
pub mod enrichment;
pub mod error;
pub mod health;
pub mod image_cc;
pub mod metrics;
pub mod mute;
pub mod ntfy;
pub mod photo_cache;
pub mod print;

pub use config::{
    EnrichmentConfig, EnrichmentType, HealthPingerConfig, ImageAttachMethod, NotifierConfig,
    NtfyPriority,
};
pub use dispatcher::{Notifier, Suppression};
pub use enrichment::Enricher;
pub use error::{NotifierError, NotifierResult};
pub use health::{HealthPing, HealthPinger};
pub use mute::MuteState;
pub use photo_cache::PhotoCache;
pub use print::print_notifier;
