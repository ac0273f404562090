//! JSON-file store backend: one document per connection id.

use super::{PlayerStore, StoreError};
use async_trait::async_trait;
use protocol::{PlayerId, PlayerRecord};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::info;

/// Writes each record to `<dir>/<id>.json`.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create) the data directory.
    ///
    /// Connection ids restart from 1 every run, so records left behind by a
    /// crashed process would be handed to unrelated new connections; any
    /// leftover documents are cleared here instead.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut stale = 0usize;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
                stale += 1;
            }
        }
        if stale > 0 {
            info!("Cleared {} stale player records from {:?}", stale, dir);
        }

        Ok(Self { dir })
    }

    fn record_path(&self, id: PlayerId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl PlayerStore for JsonFileStore {
    async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError> {
        match tokio::fs::read_to_string(self.record_path(id)).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.record_path(record.id), contents).await?;
        Ok(())
    }

    async fn delete(&self, id: PlayerId) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.record_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
