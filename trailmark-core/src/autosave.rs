//! Periodic flush of the episode buffer
//!
//! The scheduler is a tokio task that wakes every `interval`, drains the
//! shared buffer and hands the episode to the store. An empty buffer is a
//! no-op, so no empty episodes are written and no ids are allocated.
//!
//! A failed store drops the drained episode (after any configured retries)
//! and reports it through [`FlushOutcome::Failed`] and the event channel.
//! In-memory state is never rolled back or corrupted.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::AutosaveConfig;
use crate::error::{Result, TrailmarkError};
use crate::events::EventEmitter;
use crate::recorder::{Episode, SharedEpisodeBuffer};
use crate::retry::FlushRetryPolicy;
use crate::storage::{EpisodeId, EpisodeStore};

/// Result of one flush attempt
#[derive(Debug)]
pub enum FlushOutcome {
    /// Buffer was empty; nothing was written
    Skipped,

    /// Episode persisted
    Stored {
        id: EpisodeId,
        ticks: usize,
        attempts: usize,
    },

    /// Episode could not be persisted and was dropped
    Failed {
        error: TrailmarkError,
        dropped_ticks: usize,
        attempts: usize,
    },
}

impl FlushOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, FlushOutcome::Stored { .. })
    }

    pub fn stored_id(&self) -> Option<EpisodeId> {
        match self {
            FlushOutcome::Stored { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Store `episode`, retrying transient failures per `policy`.
///
/// Returns the last result and the number of store calls made.
async fn store_episode(
    store: &dyn EpisodeStore,
    episode: Episode,
    policy: &FlushRetryPolicy,
) -> (Result<EpisodeId>, usize) {
    if !policy.retries() {
        return (store.store(episode).await, 1);
    }

    let mut failures = 0;
    loop {
        match store.store(episode.clone()).await {
            Ok(id) => return (Ok(id), failures + 1),
            Err(error) => {
                failures += 1;
                if failures >= policy.attempts || !error.is_transient() {
                    return (Err(error), failures);
                }
                let wait = policy.wait_after(failures);
                tracing::warn!(
                    attempt = failures,
                    attempts = policy.attempts,
                    wait_ms = wait.as_millis() as u64,
                    "Episode store failed, retrying: {}",
                    error
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}

/// Drain the buffer and persist it once.
///
/// The buffer lock is held only for the drain itself; the store call runs
/// after it is released so ticks keep flowing during slow writes.
pub async fn flush_once(
    buffer: &SharedEpisodeBuffer,
    store: &dyn EpisodeStore,
    retry: &FlushRetryPolicy,
    emitter: &EventEmitter,
) -> FlushOutcome {
    let episode = {
        let mut guard = buffer.lock().await;
        if guard.is_empty() {
            drop(guard);
            tracing::debug!("Episode buffer empty, skipping flush");
            emitter.flush_skipped();
            return FlushOutcome::Skipped;
        }
        guard.drain()
    };

    let ticks = episode.len();
    let (result, attempts) = store_episode(store, episode, retry).await;

    match result {
        Ok(id) => {
            tracing::info!(episode_id = %id, ticks, attempts, "Episode saved");
            emitter.episode_stored(id, ticks, attempts);
            FlushOutcome::Stored {
                id,
                ticks,
                attempts,
            }
        }
        Err(error) => {
            tracing::error!(
                dropped_ticks = ticks,
                attempts,
                "Failed to save episode, dropping it: {}",
                error
            );
            emitter.flush_failed(&error.to_string(), ticks, attempts);
            FlushOutcome::Failed {
                error,
                dropped_ticks: ticks,
                attempts,
            }
        }
    }
}

/// Spawns the periodic flush task
pub struct AutosaveScheduler;

impl AutosaveScheduler {
    /// Start flushing `buffer` into `store` every `config.interval`.
    ///
    /// The first flush happens one full interval after the call. Must be
    /// called from within a tokio runtime.
    pub fn spawn(
        buffer: SharedEpisodeBuffer,
        store: Arc<dyn EpisodeStore>,
        config: &AutosaveConfig,
        emitter: EventEmitter,
    ) -> AutosaveHandle {
        let period = config.interval;
        let retry = config.retry.clone();
        let token = CancellationToken::new();
        let task_token = token.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        flush_once(&buffer, store.as_ref(), &retry, &emitter).await;
                    }
                }
            }
            tracing::debug!("Autosave task stopped");
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "Autosave task started");
        AutosaveHandle {
            token,
            task: Some(task),
            period,
        }
    }
}

/// Handle to a running autosave task
///
/// Dropping the handle cancels the task without waiting for it.
pub struct AutosaveHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
    period: Duration,
}

impl AutosaveHandle {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the task and wait for it to stop.
    ///
    /// A flush already in progress completes first; no flush starts after
    /// this returns.
    pub async fn shutdown(mut self) -> Result<()> {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| TrailmarkError::Other(format!("Autosave task failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for AutosaveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutosaveHandle")
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}
