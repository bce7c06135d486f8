//! Request handlers.

pub mod health;
pub mod mute;
pub mod photo;

pub use health::*;
pub use mute::*;
pub use photo::*;
