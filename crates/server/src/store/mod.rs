//! Player record persistence.
//!
//! The registry is the authority and the store is best effort: handlers
//! never await writes. They enqueue commands on a [`StoreHandle`] and a
//! single writer task drains them in order, so the last write for an id
//! always lands last and a disconnect's delete cannot be overtaken by an
//! earlier save.

mod json;
mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use protocol::{PlayerId, PlayerRecord};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Store failures. Logged by the writer task, never surfaced to players.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed stored record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Key-value document store for player records, keyed by connection id.
#[async_trait]
pub trait PlayerStore: Send + Sync {
    async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError>;
    async fn save(&self, record: &PlayerRecord) -> Result<(), StoreError>;
    async fn delete(&self, id: PlayerId) -> Result<(), StoreError>;
}

/// A write queued for the writer task.
#[derive(Debug, Clone)]
pub enum StoreCommand {
    Save(PlayerRecord),
    Delete(PlayerId),
}

/// Cloneable fire-and-forget front end for store writes.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    tx: mpsc::UnboundedSender<StoreCommand>,
}

impl StoreHandle {
    /// Create a handle plus the command stream a writer task consumes.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StoreCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a save. Dropped silently if the writer is gone.
    pub fn save(&self, record: PlayerRecord) {
        if self.tx.send(StoreCommand::Save(record)).is_err() {
            debug!("Store writer gone; dropping save");
        }
    }

    /// Queue a delete.
    pub fn delete(&self, id: PlayerId) {
        if self.tx.send(StoreCommand::Delete(id)).is_err() {
            debug!("Store writer gone; dropping delete for {}", id);
        }
    }
}

/// Drain store commands in order, logging failures and moving on.
pub fn spawn_store_writer(
    store: Arc<dyn PlayerStore>,
    mut rx: mpsc::UnboundedReceiver<StoreCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                StoreCommand::Save(record) => {
                    let id = record.id;
                    if let Err(e) = store.save(&record).await {
                        warn!("Failed to persist player {}: {}", id, e);
                    }
                }
                StoreCommand::Delete(id) => {
                    if let Err(e) = store.delete(id).await {
                        warn!("Failed to delete player record {}: {}", id, e);
                    }
                }
            }
        }
    })
}
