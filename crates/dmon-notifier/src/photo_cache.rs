//! TTL-bounded photo cache keyed by notification id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use dmon_models::PhotoRecord;

/// Photo records written by the notifier and read by the control server.
#[derive(Debug, Clone, Default)]
pub struct PhotoCache {
    records: Arc<RwLock<HashMap<String, PhotoRecord>>>,
}

impl PhotoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: PhotoRecord) {
        self.records.write().await.insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<PhotoRecord> {
        self.records.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.records.read().await.contains_key(id)
    }

    /// Remove every record that expired before `now`. Returns how many were removed.
    pub async fn prune_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    pub async fn prune_expired(&self) -> usize {
        self.prune_expired_at(Utc::now()).await
    }
}
