//! driveway-monitor worker.
//!
//! This crate provides:
//! - Command line and configuration file handling
//! - Logging initialization
//! - Detection ingress from newline-delimited JSON records
//! - Wiring of the tracker, notifier, health pinger and control server

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingress;
pub mod logging;

pub use cli::Args;
pub use config::{Config, ModelConfig};
pub use error::{WorkerError, WorkerResult};
pub use ingress::{DetectionRecord, Ingress};
