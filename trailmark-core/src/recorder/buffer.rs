//! In-progress episode buffer

use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Episode, ObservationRecord};

/// Buffer shared by the tick loop and the autosave task.
///
/// Both sides take the lock for the whole append or drain, so a tick is
/// never split across two episodes.
pub type SharedEpisodeBuffer = Arc<Mutex<EpisodeBuffer>>;

/// Ordered, growable collection of one in-progress episode
#[derive(Debug)]
pub struct EpisodeBuffer {
    session_id: Uuid,
    episode: Episode,
}

impl EpisodeBuffer {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            episode: Episode::new(session_id),
        }
    }

    /// Wrap a fresh buffer for sharing with the autosave task
    pub fn shared(session_id: Uuid) -> SharedEpisodeBuffer {
        Arc::new(Mutex::new(Self::new(session_id)))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Append one tick
    pub fn append(&mut self, record: ObservationRecord) {
        self.episode.push(record);
    }

    /// Take the accumulated episode and reset to empty.
    ///
    /// Draining an empty buffer yields an empty episode.
    pub fn drain(&mut self) -> Episode {
        let mut drained = std::mem::replace(&mut self.episode, Episode::new(self.session_id));
        drained.finish();
        drained
    }

    pub fn len(&self) -> usize {
        self.episode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episode.is_empty()
    }

    /// Read-only view of the in-progress episode
    pub fn episode(&self) -> &Episode {
        &self.episode
    }
}
