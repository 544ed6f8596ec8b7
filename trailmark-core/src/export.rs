//! Export of the full stored history
//!
//! Export is on-demand. It always covers every stored episode, with no
//! filtering or pagination, and an empty store yields a valid document with
//! an empty `episodes` sequence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TrailmarkError};
use crate::recorder::{ACTION_FIELDS, EPISODE_SCHEMA_VERSION, STATE_FIELDS};
use crate::storage::{EpisodeStore, StoredEpisode};

/// Default name of the exported file
pub const EXPORT_FILE_NAME: &str = "episodes.json";

/// The exported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Episode schema version the records follow
    pub schema_version: u32,

    /// When the export was produced
    pub exported_at: DateTime<Utc>,

    /// Names of the state vector entries
    pub state_fields: Vec<String>,

    /// Names of the action vector entries
    pub action_fields: Vec<String>,

    /// Every stored episode, ascending by id
    pub episodes: Vec<StoredEpisode>,
}

impl ExportDocument {
    pub fn new(episodes: Vec<StoredEpisode>) -> Self {
        Self {
            schema_version: EPISODE_SCHEMA_VERSION,
            exported_at: Utc::now(),
            state_fields: STATE_FIELDS.iter().map(|s| s.to_string()).collect(),
            action_fields: ACTION_FIELDS.iter().map(|s| s.to_string()).collect(),
            episodes,
        }
    }

    /// Total ticks across all episodes
    pub fn total_ticks(&self) -> usize {
        self.episodes.iter().map(|s| s.episode.len()).sum()
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Read every stored episode into a document
pub async fn export(store: &dyn EpisodeStore) -> Result<ExportDocument> {
    let episodes = store.read_all().await?;
    tracing::debug!(episodes = episodes.len(), "Collected episodes for export");
    Ok(ExportDocument::new(episodes))
}

/// Host primitive that offers a file to the user
#[async_trait]
pub trait DownloadTarget: Send + Sync {
    /// Deliver `contents` under `file_name`; returns where it ended up
    async fn offer(&self, file_name: &str, contents: &[u8]) -> Result<String>;
}

/// Writes offered files into a directory
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    dir: PathBuf,
}

impl DirectoryDownload {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DownloadTarget for DirectoryDownload {
    async fn offer(&self, file_name: &str, contents: &[u8]) -> Result<String> {
        if file_name.contains(['/', '\\']) {
            return Err(TrailmarkError::Export(format!(
                "file name must not contain a path separator: {}",
                file_name
            )));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(file_name);
        let partial = self.dir.join(format!(".{}.partial", file_name));

        tokio::fs::write(&partial, contents).await?;
        tokio::fs::rename(&partial, &target).await?;
        Ok(target.display().to_string())
    }
}

/// What an export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub episodes: usize,
    pub ticks: usize,
    pub location: String,
}

/// Export the store and hand the document to `target`
pub async fn export_to(
    store: &dyn EpisodeStore,
    target: &dyn DownloadTarget,
    file_name: &str,
    pretty: bool,
) -> Result<ExportSummary> {
    let document = export(store).await?;
    let json = document.to_json(pretty)?;
    let location = target.offer(file_name, json.as_bytes()).await?;

    tracing::info!(
        episodes = document.episodes.len(),
        location = %location,
        "Exported episodes"
    );
    Ok(ExportSummary {
        episodes: document.episodes.len(),
        ticks: document.total_ticks(),
        location,
    })
}
