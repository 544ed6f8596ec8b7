//! Persistence sink for recorded episodes
//!
//! Stores are append-only: every [`EpisodeStore::store`] allocates a new,
//! strictly increasing [`EpisodeId`] and never overwrites an earlier record.

mod jsonl;
mod memory;

pub use jsonl::{JsonlEpisodeStore, STORE_FILE_NAME};
pub use memory::InMemoryEpisodeStore;

use crate::config::{StorageConfig, StorageMode};
use crate::error::Result;
use crate::recorder::Episode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifier assigned to a stored episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpisodeId(pub u64);

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An episode together with the id the store gave it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEpisode {
    pub id: EpisodeId,
    pub episode: Episode,
}

/// Trait for episode storage backends
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Create the backing store if it is absent; no-op otherwise
    async fn init(&self) -> Result<()>;

    /// Append an episode under a newly allocated id
    async fn store(&self, episode: Episode) -> Result<EpisodeId>;

    /// Every stored episode, ascending by id
    async fn read_all(&self) -> Result<Vec<StoredEpisode>>;

    /// Number of stored episodes
    async fn count(&self) -> Result<usize> {
        Ok(self.read_all().await?.len())
    }
}

/// Build and initialize the store described by `config`
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn EpisodeStore>> {
    let store: Arc<dyn EpisodeStore> = match &config.mode {
        StorageMode::Memory => {
            Arc::new(InMemoryEpisodeStore::new().with_max_episodes(config.max_episodes))
        }
        StorageMode::Jsonl { data_dir } => {
            Arc::new(JsonlEpisodeStore::new(data_dir).with_max_episodes(config.max_episodes))
        }
    };
    store.init().await?;
    Ok(store)
}

#[cfg(test)]
mod tests;
