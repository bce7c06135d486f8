//! Application state.

use tokio::sync::mpsc::UnboundedSender;

use dmon_models::Notification;
use dmon_notifier::{MuteState, PhotoCache};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Written by `/mute`, read by the notifier
    pub mute: MuteState,
    /// Written by the notifier, read by `/photo` and `/mute`
    pub photos: PhotoCache,
    /// Feedback notifications for mute/unmute acknowledgements
    pub notifications: UnboundedSender<Notification>,
}

impl AppState {
    pub fn new(
        mute: MuteState,
        photos: PhotoCache,
        notifications: UnboundedSender<Notification>,
    ) -> Self {
        Self {
            mute,
            photos,
            notifications,
        }
    }
}
