//! In-memory episode store

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{EpisodeId, EpisodeStore, StoredEpisode};
use crate::error::{Result, TrailmarkError};
use crate::recorder::Episode;

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    episodes: BTreeMap<EpisodeId, Episode>,
}

/// Volatile store, mainly for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryEpisodeStore {
    inner: RwLock<Inner>,
    max_episodes: Option<usize>,
}

impl InMemoryEpisodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse writes beyond `limit` episodes
    pub fn with_max_episodes(mut self, limit: Option<usize>) -> Self {
        self.max_episodes = limit;
        self
    }
}

#[async_trait]
impl EpisodeStore for InMemoryEpisodeStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn store(&self, episode: Episode) -> Result<EpisodeId> {
        let mut inner = self.inner.write().await;

        if let Some(limit) = self.max_episodes {
            if inner.episodes.len() >= limit {
                return Err(TrailmarkError::QuotaExceeded {
                    stored: inner.episodes.len(),
                    limit,
                });
            }
        }

        inner.next_id += 1;
        let id = EpisodeId(inner.next_id);
        inner.episodes.insert(id, episode);
        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<StoredEpisode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .episodes
            .iter()
            .map(|(id, episode)| StoredEpisode {
                id: *id,
                episode: episode.clone(),
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.episodes.len())
    }
}
