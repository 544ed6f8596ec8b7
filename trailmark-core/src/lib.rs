//! # Trailmark - per-tick episode recording
//!
//! Trailmark records what a character does in a small interactive scene as
//! reinforcement-learning style trajectories:
//! - One (state, action, reward) observation per tick
//! - Proximity to points of interest (bench, sofa, bed) with a strict radius
//! - Episodes buffered in memory and flushed to an append-only store on a timer
//! - Full-history export to a single `episodes.json` document
//!
//! Trajectories are only recorded here; nothing in this crate learns from them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trailmark_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConfigBuilder::new().in_memory().build()?;
//!     let mut session = RecordingSession::builder()
//!         .config(config)
//!         .scene(Scene::park_and_house())
//!         .start()
//!         .await?;
//!
//!     let mut input = FixedInput::new(MoveDirection::Right, false);
//!     for _ in 0..60 {
//!         session.tick(&mut input).await?;
//!     }
//!
//!     session.shutdown().await?;
//!     let document = session.export().await?;
//!     println!("{} episodes", document.episodes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **world**: positions, points of interest, nearest-point queries, scene latch
//! - **recorder**: step sampling and the episode buffer
//! - **storage**: `EpisodeStore` trait with in-memory and JSON-lines backends
//! - **autosave**: periodic, cancellable flush task
//! - **export**: full-history JSON document and download targets
//! - **session**: the controller hosts drive once per frame

pub mod autosave;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod input;
pub mod recorder;
pub mod retry;
pub mod session;
pub mod simulation;
pub mod storage;
pub mod world;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::autosave::{AutosaveHandle, AutosaveScheduler, FlushOutcome, flush_once};
    pub use crate::config::{
        AutosaveConfig, ConfigBuilder, ExportConfig, RecorderConfig, StorageConfig, StorageMode,
        TrailmarkConfig,
    };
    pub use crate::error::{Result, TrailmarkError};
    pub use crate::events::{EventEmitter, EventReceiver, EventSender, RecorderEvent, event_channel};
    pub use crate::export::{
        DirectoryDownload, DownloadTarget, EXPORT_FILE_NAME, ExportDocument, ExportSummary,
        export, export_to,
    };
    pub use crate::input::{
        FixedInput, InputFlags, InputFrame, InputSource, MoveDirection, ScriptedInput,
    };
    pub use crate::recorder::{
        ACTION_FIELDS, EPISODE_SCHEMA_VERSION, Episode, EpisodeBuffer, ObservationRecord,
        STATE_FIELDS, SharedEpisodeBuffer, sample,
    };
    pub use crate::retry::FlushRetryPolicy;
    pub use crate::session::{RecordingSession, RecordingSessionBuilder};
    pub use crate::simulation::{SimulationContext, TickOutcome};
    pub use crate::storage::{
        EpisodeId, EpisodeStore, InMemoryEpisodeStore, JsonlEpisodeStore, StoredEpisode,
        open_store,
    };
    pub use crate::world::{
        INTERACTION_RADIUS, Nearest, PoiCategory, PointOfInterest, Position, Scene, SceneBuilder,
        nearest,
    };
}
