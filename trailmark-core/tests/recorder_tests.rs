//! End-to-end tests for recording sessions
//!
//! These drive a session the way a host render loop would: ticks from an
//! input source, autosave on a paused clock, export at the end.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use trailmark_core::prelude::*;

fn bench_at_origin() -> Scene {
    Scene::builder()
        .point(PointOfInterest::bench(Position::ground(0.0, 0.0)))
        .build()
}

fn memory_config() -> TrailmarkConfig {
    ConfigBuilder::new().in_memory().build().unwrap()
}

#[tokio::test]
async fn test_walk_then_sit_scenario() {
    let mut session = RecordingSession::builder()
        .config(memory_config())
        .scene(bench_at_origin())
        .start()
        .await
        .unwrap();

    let mut input = ScriptedInput::new([
        InputFrame::new(MoveDirection::Right, false).times(3),
        InputFrame::new(MoveDirection::Idle, true),
    ]);
    for _ in 0..4 {
        session.tick(&mut input).await.unwrap();
    }
    assert!((session.simulation().position().x - 0.6).abs() < 1e-9);

    let outcome = session.flush_now().await;
    let id = outcome.stored_id().expect("episode stored");

    let document = session.export().await.unwrap();
    assert_eq!(document.episodes.len(), 1);
    let stored = &document.episodes[0];
    assert_eq!(stored.id, id);
    assert_eq!(stored.episode.rewards(), &[0.0, 0.0, 0.0, 1.0]);
    assert_eq!(stored.episode.states()[3][2], 1.0);
    assert_eq!(stored.episode.session_id, session.session_id());

    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_autosave_cycles_through_session() {
    let (tx, mut rx) = event_channel(64);
    let mut session = RecordingSession::builder()
        .config(memory_config())
        .scene(bench_at_origin())
        .events(EventEmitter::new(tx))
        .start()
        .await
        .unwrap();
    assert!(session.is_autosaving());

    let mut input = FixedInput::new(MoveDirection::Right, false);
    for _ in 0..10 {
        session.tick(&mut input).await.unwrap();
    }
    tokio::time::sleep(Duration::from_secs(31)).await;
    tokio::task::yield_now().await;

    assert_eq!(session.buffered_ticks().await, 0);
    assert_eq!(session.store().count().await.unwrap(), 1);
    match rx.recv().await {
        Some(RecorderEvent::EpisodeStored { ticks, .. }) => assert_eq!(ticks, 10),
        other => panic!("expected episode_stored, got {:?}", other),
    }

    // Empty period: skipped, no id allocated
    tokio::time::sleep(Duration::from_secs(30)).await;
    tokio::task::yield_now().await;
    assert!(matches!(rx.recv().await, Some(RecorderEvent::FlushSkipped { .. })));
    assert_eq!(session.store().count().await.unwrap(), 1);

    // Remaining ticks land in a final flush on shutdown
    session.tick(&mut input).await.unwrap();
    let final_flush = session.shutdown().await.unwrap();
    assert_eq!(final_flush.and_then(|o| o.stored_id()), Some(EpisodeId(2)));
    assert!(matches!(
        session.tick(&mut input).await,
        Err(TrailmarkError::Shutdown)
    ));
    assert!(session.shutdown().await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_persists_to_jsonl_and_exports() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new()
        .storage(StorageConfig {
            mode: StorageMode::Jsonl {
                data_dir: dir.path().join("data"),
            },
            max_episodes: None,
        })
        .autosave(AutosaveConfig {
            enabled: false,
            ..Default::default()
        })
        .export(ExportConfig {
            out_dir: dir.path().join("export"),
            ..Default::default()
        })
        .build()
        .unwrap();

    let mut session = RecordingSession::builder()
        .config(config.clone())
        .scene(Scene::park_and_house())
        .start()
        .await
        .unwrap();
    assert!(!session.is_autosaving());

    let mut input = FixedInput::new(MoveDirection::Left, false);
    for _ in 0..3 {
        session.tick(&mut input).await.unwrap();
    }
    session.flush_now().await;
    for _ in 0..2 {
        session.tick(&mut input).await.unwrap();
    }
    session.shutdown().await.unwrap();

    let summary = session.export_to_dir().await.unwrap();
    assert_eq!(summary.episodes, 2);
    assert_eq!(summary.ticks, 5);

    let exported = dir.path().join("export").join(EXPORT_FILE_NAME);
    let written = std::fs::read_to_string(exported).unwrap();
    let document = ExportDocument::from_json(&written).unwrap();
    assert_eq!(document.schema_version, EPISODE_SCHEMA_VERSION);
    assert_eq!(document.state_fields.len(), 5);
    assert!(document.episodes.iter().all(|s| s.episode.is_aligned()));

    // A second session on the same directory continues the id sequence
    let mut next = RecordingSession::builder()
        .config(config)
        .start()
        .await
        .unwrap();
    next.tick(&mut input).await.unwrap();
    let outcome = next.flush_now().await;
    assert_eq!(outcome.stored_id(), Some(EpisodeId(3)));
}

struct UnavailableStore;

#[async_trait]
impl EpisodeStore for UnavailableStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn store(&self, _episode: Episode) -> Result<EpisodeId> {
        Err(TrailmarkError::Storage("storage unavailable".to_string()))
    }

    async fn read_all(&self) -> Result<Vec<StoredEpisode>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_store_failure_surfaces_and_recording_continues() {
    let (tx, mut rx) = event_channel(16);
    let mut session = RecordingSession::builder()
        .config(memory_config())
        .store(Arc::new(UnavailableStore))
        .events(EventEmitter::new(tx))
        .start()
        .await
        .unwrap();

    let mut input = FixedInput::new(MoveDirection::Right, true);
    for _ in 0..5 {
        session.tick(&mut input).await.unwrap();
    }

    let outcome = session.flush_now().await;
    assert!(matches!(
        outcome,
        FlushOutcome::Failed {
            dropped_ticks: 5,
            ..
        }
    ));
    assert!(matches!(
        rx.recv().await,
        Some(RecorderEvent::FlushFailed { dropped_ticks: 5, .. })
    ));

    session.tick(&mut input).await.unwrap();
    assert_eq!(session.buffered_ticks().await, 1);

    let document = session.export().await.unwrap();
    assert!(document.episodes.is_empty());
}

#[tokio::test]
async fn test_indoor_unlock_event() {
    let (tx, mut rx) = event_channel(16);
    let mut session = RecordingSession::builder()
        .config(memory_config())
        .scene(Scene::park_and_house())
        .start_at(Position::new(4.0, 0.25, -200.0))
        .events(EventEmitter::new(tx))
        .start()
        .await
        .unwrap();

    let mut input = FixedInput::new(MoveDirection::Idle, true);
    let outcome = session.tick(&mut input).await.unwrap();

    assert!(outcome.unlocked_indoor);
    assert_eq!(outcome.record.state[2..], [0.0, 0.0, 1.0]);
    assert_eq!(outcome.record.reward, 3.0);
    assert!(matches!(
        rx.recv().await,
        Some(RecorderEvent::IndoorUnlocked { tick: 0, .. })
    ));
}
