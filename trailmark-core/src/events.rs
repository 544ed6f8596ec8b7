//! Recorder events for observability
//!
//! Flushes and exports report their outcome on an event channel so hosts
//! can alert, queue or retry instead of losing data silently.
//!
//! # Example
//!
//! ```rust,ignore
//! use trailmark_core::events::{event_channel, RecorderEvent};
//!
//! let (tx, mut rx) = event_channel(64);
//!
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         if let RecorderEvent::FlushFailed { error, dropped_ticks, .. } = event {
//!             eprintln!("lost {} ticks: {}", dropped_ticks, error);
//!         }
//!     }
//! });
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::storage::EpisodeId;

/// Events emitted by a recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecorderEvent {
    /// A drained episode was persisted
    EpisodeStored {
        id: EpisodeId,
        ticks: usize,
        attempts: usize,
        timestamp: DateTime<Utc>,
    },

    /// A flush found the buffer empty and wrote nothing
    FlushSkipped { timestamp: DateTime<Utc> },

    /// A drained episode could not be persisted and was dropped
    FlushFailed {
        error: String,
        dropped_ticks: usize,
        attempts: usize,
        timestamp: DateTime<Utc>,
    },

    /// Indoor points of interest became active
    IndoorUnlocked { tick: u64, timestamp: DateTime<Utc> },

    /// The stored history was exported
    Exported {
        episodes: usize,
        location: String,
        timestamp: DateTime<Utc>,
    },
}

impl RecorderEvent {
    /// Short name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            RecorderEvent::EpisodeStored { .. } => "episode_stored",
            RecorderEvent::FlushSkipped { .. } => "flush_skipped",
            RecorderEvent::FlushFailed { .. } => "flush_failed",
            RecorderEvent::IndoorUnlocked { .. } => "indoor_unlocked",
            RecorderEvent::Exported { .. } => "exported",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            RecorderEvent::EpisodeStored { timestamp, .. }
            | RecorderEvent::FlushSkipped { timestamp }
            | RecorderEvent::FlushFailed { timestamp, .. }
            | RecorderEvent::IndoorUnlocked { timestamp, .. }
            | RecorderEvent::Exported { timestamp, .. } => *timestamp,
        }
    }
}

/// Sender half of the event channel
pub type EventSender = mpsc::Sender<RecorderEvent>;

/// Receiver half of the event channel
pub type EventReceiver = mpsc::Receiver<RecorderEvent>;

/// Create a bounded event channel
pub fn event_channel(buffer_size: usize) -> (EventSender, EventReceiver) {
    mpsc::channel(buffer_size)
}

/// Publishes recorder events, if anyone is listening
///
/// Emission never blocks: when the channel is full the event is dropped
/// and logged, so a slow listener cannot stall the tick loop or autosave.
#[derive(Clone, Default)]
pub struct EventEmitter {
    sender: Option<EventSender>,
}

impl EventEmitter {
    pub fn new(sender: EventSender) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Emitter that discards every event
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    pub fn emit(&self, event: RecorderEvent) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event = event.event_type(), "Event channel full, dropping event");
            }
        }
    }

    pub fn episode_stored(&self, id: EpisodeId, ticks: usize, attempts: usize) {
        self.emit(RecorderEvent::EpisodeStored {
            id,
            ticks,
            attempts,
            timestamp: Utc::now(),
        });
    }

    pub fn flush_skipped(&self) {
        self.emit(RecorderEvent::FlushSkipped {
            timestamp: Utc::now(),
        });
    }

    pub fn flush_failed(&self, error: &str, dropped_ticks: usize, attempts: usize) {
        self.emit(RecorderEvent::FlushFailed {
            error: error.to_string(),
            dropped_ticks,
            attempts,
            timestamp: Utc::now(),
        });
    }

    pub fn indoor_unlocked(&self, tick: u64) {
        self.emit(RecorderEvent::IndoorUnlocked {
            tick,
            timestamp: Utc::now(),
        });
    }

    pub fn exported(&self, episodes: usize, location: &str) {
        self.emit(RecorderEvent::Exported {
            episodes,
            location: location.to_string(),
            timestamp: Utc::now(),
        });
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("enabled", &self.sender.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emitter_delivers_events() {
        let (tx, mut rx) = event_channel(8);
        let emitter = EventEmitter::new(tx);

        emitter.episode_stored(EpisodeId(4), 120, 1);
        emitter.flush_skipped();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.event_type(), "episode_stored");
        assert!(matches!(
            first,
            RecorderEvent::EpisodeStored {
                id: EpisodeId(4),
                ticks: 120,
                ..
            }
        ));
        assert_eq!(rx.recv().await.unwrap().event_type(), "flush_skipped");
    }

    #[test]
    fn test_full_channel_does_not_block() {
        let (tx, _rx) = event_channel(1);
        let emitter = EventEmitter::new(tx);
        emitter.flush_skipped();
        emitter.flush_skipped();
    }

    #[test]
    fn test_disabled_and_closed_emitters_are_silent() {
        EventEmitter::disabled().flush_failed("boom", 3, 1);

        let (tx, rx) = event_channel(1);
        drop(rx);
        EventEmitter::new(tx).flush_failed("boom", 3, 1);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = RecorderEvent::FlushFailed {
            error: "quota".to_string(),
            dropped_ticks: 9,
            attempts: 1,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "flush_failed");
        assert_eq!(value["dropped_ticks"], 9);
    }
}
