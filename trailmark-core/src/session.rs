//! Recording session: the single controller a host drives
//!
//! A session owns the simulation context, the store, the autosave task and
//! the event emitter. Hosts call [`RecordingSession::tick`] once per frame
//! and [`RecordingSession::shutdown`] before tearing the store down.

use std::sync::Arc;
use uuid::Uuid;

use crate::autosave::{AutosaveHandle, AutosaveScheduler, FlushOutcome, flush_once};
use crate::config::TrailmarkConfig;
use crate::error::{Result, TrailmarkError};
use crate::events::EventEmitter;
use crate::export::{
    DirectoryDownload, DownloadTarget, ExportDocument, ExportSummary, export, export_to,
};
use crate::input::InputSource;
use crate::recorder::{EpisodeBuffer, SharedEpisodeBuffer};
use crate::simulation::{SimulationContext, TickOutcome};
use crate::storage::{EpisodeStore, open_store};
use crate::world::{Position, Scene};

/// Builder for RecordingSession
pub struct RecordingSessionBuilder {
    config: TrailmarkConfig,
    scene: Scene,
    start: Position,
    store: Option<Arc<dyn EpisodeStore>>,
    emitter: EventEmitter,
}

impl RecordingSessionBuilder {
    pub fn config(mut self, config: TrailmarkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn scene(mut self, scene: Scene) -> Self {
        self.scene = scene;
        self
    }

    /// Character start position
    pub fn start_at(mut self, position: Position) -> Self {
        self.start = position;
        self
    }

    /// Use this store instead of opening one from the configuration
    pub fn store(mut self, store: Arc<dyn EpisodeStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn events(mut self, emitter: EventEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    /// Validate the configuration, open the store and start autosave.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(self) -> Result<RecordingSession> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => {
                store.init().await?;
                store
            }
            None => open_store(&self.config.storage).await?,
        };

        let session_id = Uuid::new_v4();
        let buffer = EpisodeBuffer::shared(session_id);
        let simulation = SimulationContext::new(
            self.scene,
            self.start,
            self.config.recorder.step_size,
            buffer.clone(),
        );

        let autosave = if self.config.autosave.enabled {
            Some(AutosaveScheduler::spawn(
                buffer.clone(),
                store.clone(),
                &self.config.autosave,
                self.emitter.clone(),
            ))
        } else {
            None
        };

        tracing::info!(
            session_id = %session_id,
            autosave = autosave.is_some(),
            "Recording session started"
        );

        Ok(RecordingSession {
            session_id,
            config: self.config,
            simulation,
            buffer,
            store,
            autosave,
            emitter: self.emitter,
            shut_down: false,
        })
    }
}

/// A running recording session
pub struct RecordingSession {
    session_id: Uuid,
    config: TrailmarkConfig,
    simulation: SimulationContext,
    buffer: SharedEpisodeBuffer,
    store: Arc<dyn EpisodeStore>,
    autosave: Option<AutosaveHandle>,
    emitter: EventEmitter,
    shut_down: bool,
}

impl RecordingSession {
    pub fn builder() -> RecordingSessionBuilder {
        RecordingSessionBuilder {
            config: TrailmarkConfig::default(),
            scene: Scene::empty(),
            start: Position::default(),
            store: None,
            emitter: EventEmitter::disabled(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &TrailmarkConfig {
        &self.config
    }

    pub fn simulation(&self) -> &SimulationContext {
        &self.simulation
    }

    pub fn store(&self) -> &Arc<dyn EpisodeStore> {
        &self.store
    }

    pub fn is_autosaving(&self) -> bool {
        self.autosave.as_ref().is_some_and(|a| a.is_running())
    }

    /// Ticks waiting for the next flush
    pub async fn buffered_ticks(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Run one tick of the recorder
    pub async fn tick(&mut self, input: &mut dyn InputSource) -> Result<TickOutcome> {
        if self.shut_down {
            return Err(TrailmarkError::Shutdown);
        }
        let outcome = self.simulation.tick(input).await;
        if outcome.unlocked_indoor {
            self.emitter.indoor_unlocked(outcome.tick);
        }
        Ok(outcome)
    }

    /// Flush the buffer now, outside the autosave schedule
    pub async fn flush_now(&self) -> FlushOutcome {
        flush_once(
            &self.buffer,
            self.store.as_ref(),
            &self.config.autosave.retry,
            &self.emitter,
        )
        .await
    }

    /// Read the full stored history
    pub async fn export(&self) -> Result<ExportDocument> {
        export(self.store.as_ref()).await
    }

    /// Export into the configured output directory
    pub async fn export_to_dir(&self) -> Result<ExportSummary> {
        let target = DirectoryDownload::new(&self.config.export.out_dir);
        self.export_to(&target).await
    }

    /// Export and offer the document through `target`
    pub async fn export_to(&self, target: &dyn DownloadTarget) -> Result<ExportSummary> {
        let summary = export_to(
            self.store.as_ref(),
            target,
            &self.config.export.file_name,
            self.config.export.pretty,
        )
        .await?;
        self.emitter.exported(summary.episodes, &summary.location);
        Ok(summary)
    }

    /// Stop autosave and, if configured, flush what is still buffered.
    ///
    /// Idempotent. Export stays available afterwards; ticks do not. If the
    /// autosave task had failed, the final flush still runs and the task
    /// error is returned afterwards.
    pub async fn shutdown(&mut self) -> Result<Option<FlushOutcome>> {
        if self.shut_down {
            return Ok(None);
        }
        self.shut_down = true;

        let stopped = match self.autosave.take() {
            Some(autosave) => autosave.shutdown().await,
            None => Ok(()),
        };

        let final_flush = if self.config.autosave.flush_on_shutdown {
            Some(self.flush_now().await)
        } else {
            None
        };

        tracing::info!(
            session_id = %self.session_id,
            ticks = self.simulation.ticks(),
            "Recording session stopped"
        );

        if let Err(error) = stopped {
            tracing::error!("Autosave task ended abnormally: {}", error);
            return Err(error);
        }
        Ok(final_flush)
    }
}

impl std::fmt::Debug for RecordingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSession")
            .field("session_id", &self.session_id)
            .field("ticks", &self.simulation.ticks())
            .field("autosave", &self.autosave)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
