//! Global mute window shared between the notifier and the control server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// A single optional "mute until" timestamp. Last write wins.
#[derive(Debug, Clone, Default)]
pub struct MuteState {
    until: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl MuteState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn mute_until(&self) -> Option<DateTime<Utc>> {
        *self.until.read().await
    }

    pub async fn set_mute_until(&self, until: DateTime<Utc>) {
        *self.until.write().await = Some(until);
    }

    /// Whether something timestamped `t` falls inside the mute window.
    /// The active mute deadline if `t` falls before it.
    pub async fn muted_until_at(&self, t: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.mute_until().await.filter(|until| t < *until)
    }

    pub async fn is_muted_at(&self, t: DateTime<Utc>) -> bool {
        self.muted_until_at(t).await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_mute_window() {
        let state = MuteState::new();
        let now = Utc::now();
        assert!(!state.is_muted_at(now).await);

        state.set_mute_until(now + Duration::minutes(10)).await;
        assert!(state.is_muted_at(now).await);
        assert!(!state.is_muted_at(now + Duration::minutes(10)).await);
        assert!(!state.is_muted_at(now + Duration::minutes(11)).await);
        assert_eq!(
            state.muted_until_at(now).await,
            Some(now + Duration::minutes(10))
        );
        assert_eq!(state.muted_until_at(now + Duration::minutes(10)).await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let state = MuteState::new();
        let other = state.clone();
        let until = Utc::now() + Duration::hours(1);

        other.set_mute_until(until).await;
        assert_eq!(state.mute_until().await, Some(until));

        let earlier = until - Duration::minutes(30);
        state.set_mute_until(earlier).await;
        assert_eq!(other.mute_until().await, Some(earlier));
    }
}
