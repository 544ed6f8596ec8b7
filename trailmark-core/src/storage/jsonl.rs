//! Append-only JSON-lines episode store
//!
//! Each stored episode is one line of the form `{"id": n, "episode": {...}}`.
//! Lines are only ever appended. The next id is recovered from the existing
//! file when the store is opened.
//!
//! An append cut short leaves a final line without its newline. The next
//! store repairs that tail before writing: a complete record gets its
//! newline back, anything else is truncated away. Until then `read_all`
//! skips an unreadable unterminated last line with a warning. Unreadable
//! lines anywhere else fail the read.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::io::SeekFrom;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::{EpisodeId, EpisodeStore, StoredEpisode};
use crate::error::{Result, TrailmarkError};
use crate::recorder::{EPISODE_SCHEMA_VERSION, Episode};

/// File name inside the data directory
pub const STORE_FILE_NAME: &str = "episodes.jsonl";

#[derive(Debug, Clone, Copy)]
struct Cursor {
    last_id: u64,
    count: usize,
}

/// Durable store backed by a single JSON-lines file
#[derive(Debug)]
pub struct JsonlEpisodeStore {
    path: PathBuf,
    max_episodes: Option<usize>,
    cursor: Mutex<Option<Cursor>>,
}

impl JsonlEpisodeStore {
    /// Store living in `data_dir/episodes.jsonl`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STORE_FILE_NAME),
            max_episodes: None,
            cursor: Mutex::new(None),
        }
    }

    /// Refuse writes beyond `limit` episodes
    pub fn with_max_episodes(mut self, limit: Option<usize>) -> Self {
        self.max_episodes = limit;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_cursor(&self) -> Result<Cursor> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let mut cursor = Cursor {
            last_id: 0,
            count: 0,
        };
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|v| v["id"].as_u64())
            {
                Some(id) => {
                    cursor.last_id = cursor.last_id.max(id);
                    cursor.count += 1;
                }
                None => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        "Skipping unreadable line while recovering episode ids"
                    );
                }
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            last_id = cursor.last_id,
            count = cursor.count,
            "Opened episode store"
        );
        Ok(cursor)
    }

    fn parse_line(index: usize, line: &str) -> Result<StoredEpisode> {
        let corrupt = |reason: String| TrailmarkError::CorruptRecord {
            line: index + 1,
            reason,
        };

        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| corrupt(e.to_string()))?;

        let found = value["episode"]["schema_version"]
            .as_u64()
            .ok_or_else(|| corrupt("missing schema_version".to_string()))?;
        if found != u64::from(EPISODE_SCHEMA_VERSION) {
            return Err(TrailmarkError::SchemaMismatch {
                id: value["id"].as_u64().unwrap_or(0),
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: EPISODE_SCHEMA_VERSION,
            });
        }

        serde_json::from_value(value).map_err(|e| corrupt(e.to_string()))
    }

    /// Make sure `file` ends on a line boundary before appending to it
    async fn repair_tail(&self, file: &mut tokio::fs::File) -> Result<()> {
        let len = file.metadata().await?.len();
        if len == 0 {
            return Ok(());
        }
        file.seek(SeekFrom::Start(len - 1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        if last[0] == b'\n' {
            return Ok(());
        }

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0)).await?;
        file.read_to_end(&mut contents).await?;
        let line_start = contents
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |i| i + 1);
        let tail = &contents[line_start..];

        if serde_json::from_slice::<StoredEpisode>(tail).is_ok() {
            file.seek(SeekFrom::End(0)).await?;
            file.write_all(b"\n").await?;
            tracing::warn!(path = %self.path.display(), "Terminated unterminated last record");
        } else {
            file.set_len(line_start as u64).await?;
            tracing::warn!(
                path = %self.path.display(),
                dropped_bytes = tail.len(),
                "Truncated torn last record"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl EpisodeStore for JsonlEpisodeStore {
    async fn init(&self) -> Result<()> {
        let mut cursor = self.cursor.lock().await;
        if cursor.is_none() {
            *cursor = Some(self.open_cursor().await?);
        }
        Ok(())
    }

    async fn store(&self, episode: Episode) -> Result<EpisodeId> {
        let mut guard = self.cursor.lock().await;
        let mut cursor = match *guard {
            Some(cursor) => cursor,
            None => self.open_cursor().await?,
        };

        if let Some(limit) = self.max_episodes {
            if cursor.count >= limit {
                return Err(TrailmarkError::QuotaExceeded {
                    stored: cursor.count,
                    limit,
                });
            }
        }

        let id = EpisodeId(cursor.last_id + 1);
        let mut line = serde_json::to_string(&StoredEpisode { id, episode })?;
        line.push('\n');

        let storage_error = |action: &str, e: std::io::Error| {
            TrailmarkError::Storage(format!("cannot {} {}: {}", action, self.path.display(), e))
        };
        let mut file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .await
            .map_err(|e| storage_error("open", e))?;
        self.repair_tail(&mut file).await?;

        file.seek(SeekFrom::End(0)).await?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| storage_error("append to", e))?;
        file.flush().await?;
        file.sync_data().await?;

        cursor.last_id = id.0;
        cursor.count += 1;
        *guard = Some(cursor);
        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<StoredEpisode>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let torn_tail = !contents.ends_with('\n');
        let lines: Vec<(usize, &str)> = contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();
        let last_index = lines.last().map(|(index, _)| *index);

        let mut episodes = Vec::with_capacity(lines.len());
        for (index, line) in lines {
            match Self::parse_line(index, line) {
                Ok(stored) => episodes.push(stored),
                Err(TrailmarkError::CorruptRecord { line, reason })
                    if torn_tail && Some(index) == last_index =>
                {
                    tracing::warn!(
                        path = %self.path.display(),
                        line,
                        "Skipping torn last record: {}",
                        reason
                    );
                }
                Err(e) => return Err(e),
            }
        }
        episodes.sort_by_key(|stored| stored.id);
        Ok(episodes)
    }

    async fn count(&self) -> Result<usize> {
        let mut guard = self.cursor.lock().await;
        if guard.is_none() {
            *guard = Some(self.open_cursor().await?);
        }
        Ok(guard.map_or(0, |c| c.count))
    }
}
