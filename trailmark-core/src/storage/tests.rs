//! Tests for episode stores

use super::*;
use crate::error::TrailmarkError;
use crate::recorder::{EPISODE_SCHEMA_VERSION, ObservationRecord};
use tempfile::TempDir;
use uuid::Uuid;

fn episode_with(ticks: usize) -> Episode {
    let mut episode = Episode::new(Uuid::new_v4());
    for i in 0..ticks {
        episode.push(ObservationRecord {
            state: vec![i as f64 * 0.2, 0.0, 0.0, 0.0, 0.0],
            action: vec![1.0, 0.0],
            reward: 0.0,
        });
    }
    episode.finish();
    episode
}

async fn assert_append_only(store: &dyn EpisodeStore) {
    store.init().await.unwrap();

    let mut ids = Vec::new();
    for ticks in 1..=5 {
        ids.push(store.store(episode_with(ticks)).await.unwrap());
    }

    let all = store.read_all().await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(store.count().await.unwrap(), 5);
    for (i, stored) in all.iter().enumerate() {
        assert_eq!(stored.id, ids[i]);
        assert_eq!(stored.episode.len(), i + 1);
    }
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_memory_store_is_append_only() {
    let store = InMemoryEpisodeStore::new();
    assert_append_only(&store).await;
}

#[tokio::test]
async fn test_jsonl_store_is_append_only() {
    let dir = TempDir::new().unwrap();
    let store = JsonlEpisodeStore::new(dir.path());
    assert_append_only(&store).await;
}

#[tokio::test]
async fn test_memory_store_read_empty() {
    let store = InMemoryEpisodeStore::new();
    assert!(store.read_all().await.unwrap().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_jsonl_init_creates_missing_store() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("nested").join("data");
    let store = JsonlEpisodeStore::new(&nested);

    assert!(store.read_all().await.unwrap().is_empty());
    store.init().await.unwrap();
    assert!(store.path().exists());

    // Second init is a no-op
    store.init().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_jsonl_recovers_ids_after_reopen() {
    let dir = TempDir::new().unwrap();

    let first = JsonlEpisodeStore::new(dir.path());
    first.init().await.unwrap();
    first.store(episode_with(2)).await.unwrap();
    let second_id = first.store(episode_with(3)).await.unwrap();
    drop(first);

    let reopened = JsonlEpisodeStore::new(dir.path());
    reopened.init().await.unwrap();
    let next = reopened.store(episode_with(1)).await.unwrap();
    assert_eq!(next, EpisodeId(second_id.0 + 1));

    let all = reopened.read_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].episode.len(), 1);
}

#[tokio::test]
async fn test_jsonl_store_without_explicit_init() {
    let dir = TempDir::new().unwrap();
    let store = JsonlEpisodeStore::new(dir.path());
    assert_eq!(store.store(episode_with(1)).await.unwrap(), EpisodeId(1));
}

#[tokio::test]
async fn test_jsonl_schema_mismatch_fails_loudly() {
    let dir = TempDir::new().unwrap();
    let store = JsonlEpisodeStore::new(dir.path());
    store.init().await.unwrap();
    store.store(episode_with(1)).await.unwrap();

    let mut foreign = serde_json::to_value(StoredEpisode {
        id: EpisodeId(2),
        episode: episode_with(1),
    })
    .unwrap();
    foreign["episode"]["schema_version"] = serde_json::json!(EPISODE_SCHEMA_VERSION + 1);
    let mut contents = tokio::fs::read_to_string(store.path()).await.unwrap();
    contents.push_str(&serde_json::to_string(&foreign).unwrap());
    contents.push('\n');
    tokio::fs::write(store.path(), contents).await.unwrap();

    match store.read_all().await {
        Err(TrailmarkError::SchemaMismatch { id, found, expected }) => {
            assert_eq!(id, 2);
            assert_eq!(found, EPISODE_SCHEMA_VERSION + 1);
            assert_eq!(expected, EPISODE_SCHEMA_VERSION);
        }
        other => panic!("expected schema mismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_jsonl_corrupt_line_reports_line_number() {
    let dir = TempDir::new().unwrap();
    let store = JsonlEpisodeStore::new(dir.path());
    store.init().await.unwrap();
    store.store(episode_with(1)).await.unwrap();

    let mut contents = tokio::fs::read_to_string(store.path()).await.unwrap();
    contents.push_str("{not json\n");
    tokio::fs::write(store.path(), contents).await.unwrap();

    assert!(matches!(
        store.read_all().await,
        Err(TrailmarkError::CorruptRecord { line: 2, .. })
    ));
}

#[tokio::test]
async fn test_quota_exceeded() {
    let dir = TempDir::new().unwrap();
    let jsonl = JsonlEpisodeStore::new(dir.path()).with_max_episodes(Some(1));
    let memory = InMemoryEpisodeStore::new().with_max_episodes(Some(1));

    for store in [&jsonl as &dyn EpisodeStore, &memory] {
        store.init().await.unwrap();
        store.store(episode_with(1)).await.unwrap();
        assert!(matches!(
            store.store(episode_with(1)).await,
            Err(TrailmarkError::QuotaExceeded { stored: 1, limit: 1 })
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }
}

#[tokio::test]
async fn test_open_store_from_config() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig {
        mode: StorageMode::Jsonl {
            data_dir: dir.path().to_path_buf(),
        },
        max_episodes: None,
    };
    let store = open_store(&config).await.unwrap();
    assert!(dir.path().join(STORE_FILE_NAME).exists());
    store.store(episode_with(2)).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_jsonl_torn_last_line_is_repaired_on_next_store() {
    let dir = TempDir::new().unwrap();
    let first = JsonlEpisodeStore::new(dir.path());
    first.init().await.unwrap();
    first.store(episode_with(2)).await.unwrap();
    drop(first);

    // An append that stopped partway through
    let mut contents = tokio::fs::read_to_string(dir.path().join(STORE_FILE_NAME))
        .await
        .unwrap();
    contents.push_str(r#"{"id":2,"episode":{"schema_ver"#);
    tokio::fs::write(dir.path().join(STORE_FILE_NAME), contents)
        .await
        .unwrap();

    let store = JsonlEpisodeStore::new(dir.path());
    store.init().await.unwrap();
    assert_eq!(store.read_all().await.unwrap().len(), 1);

    let id = store.store(episode_with(3)).await.unwrap();
    assert_eq!(id, EpisodeId(2));

    let all = store.read_all().await.unwrap();
    let ids: Vec<_> = all.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![EpisodeId(1), EpisodeId(2)]);
    assert_eq!(all[0].episode.len(), 2);
    assert_eq!(all[1].episode.len(), 3);

    let written = tokio::fs::read_to_string(store.path()).await.unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.ends_with('\n'));
}

#[tokio::test]
async fn test_jsonl_complete_record_missing_newline_is_kept() {
    let dir = TempDir::new().unwrap();
    let store = JsonlEpisodeStore::new(dir.path());
    store.init().await.unwrap();
    store.store(episode_with(1)).await.unwrap();

    let contents = tokio::fs::read_to_string(store.path()).await.unwrap();
    tokio::fs::write(store.path(), contents.trim_end())
        .await
        .unwrap();
    assert_eq!(store.read_all().await.unwrap().len(), 1);

    store.store(episode_with(4)).await.unwrap();

    let all = store.read_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].id, EpisodeId(2));
    assert_eq!(all[1].episode.len(), 4);
}

#[tokio::test]
async fn test_jsonl_corrupt_interior_line_still_fails() {
    let dir = TempDir::new().unwrap();
    let store = JsonlEpisodeStore::new(dir.path());
    store.init().await.unwrap();
    store.store(episode_with(1)).await.unwrap();

    let record = tokio::fs::read_to_string(store.path()).await.unwrap();
    let contents = format!("{}{{not json\n{}", record, record.trim_end());
    tokio::fs::write(store.path(), contents).await.unwrap();

    assert!(matches!(
        store.read_all().await,
        Err(TrailmarkError::CorruptRecord { line: 2, .. })
    ));
}
