//! In-memory store backend.

use super::{PlayerStore, StoreError};
use async_trait::async_trait;
use protocol::{PlayerId, PlayerRecord};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// HashMap-backed store; the default backend and the test double of choice.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<PlayerId, PlayerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerStore for MemoryStore {
    async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError> {
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: PlayerId) -> Result<(), StoreError> {
        self.records.lock().await.remove(&id);
        Ok(())
    }
}
