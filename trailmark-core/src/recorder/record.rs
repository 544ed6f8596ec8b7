//! Observation records and episodes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EPISODE_SCHEMA_VERSION;

/// One tick's (state, action, reward) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub state: Vec<f64>,
    pub action: Vec<f64>,
    pub reward: f64,
}

/// A contiguous run of observation records
///
/// `states`, `actions` and `rewards` are index-aligned; the fields are
/// private so the only way to grow them is [`Episode::push`]. Deserializing
/// rejects sequences of different lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EpisodeFields")]
pub struct Episode {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// Recording session this episode belongs to
    pub session_id: Uuid,

    /// When the first record was pushed (or the episode was created)
    pub started_at: DateTime<Utc>,

    /// When the episode was drained for storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    states: Vec<Vec<f64>>,
    actions: Vec<Vec<f64>>,
    rewards: Vec<f64>,
}

/// Wire form of [`Episode`], checked before it becomes one
#[derive(Deserialize)]
struct EpisodeFields {
    schema_version: u32,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
    states: Vec<Vec<f64>>,
    actions: Vec<Vec<f64>>,
    rewards: Vec<f64>,
}

impl TryFrom<EpisodeFields> for Episode {
    type Error = String;

    fn try_from(fields: EpisodeFields) -> Result<Self, Self::Error> {
        let episode = Episode {
            schema_version: fields.schema_version,
            session_id: fields.session_id,
            started_at: fields.started_at,
            ended_at: fields.ended_at,
            states: fields.states,
            actions: fields.actions,
            rewards: fields.rewards,
        };
        if !episode.is_aligned() {
            return Err(format!(
                "misaligned episode: {} states, {} actions, {} rewards",
                episode.states.len(),
                episode.actions.len(),
                episode.rewards.len()
            ));
        }
        Ok(episode)
    }
}

impl Episode {
    /// Create an empty episode for a session
    pub fn new(session_id: Uuid) -> Self {
        Self {
            schema_version: EPISODE_SCHEMA_VERSION,
            session_id,
            started_at: Utc::now(),
            ended_at: None,
            states: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
        }
    }

    /// Append one tick
    pub fn push(&mut self, record: ObservationRecord) {
        if self.rewards.is_empty() {
            self.started_at = Utc::now();
        }
        self.states.push(record.state);
        self.actions.push(record.action);
        self.rewards.push(record.reward);
    }

    /// Mark the episode as ended
    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    /// Number of ticks
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    pub fn actions(&self) -> &[Vec<f64>] {
        &self.actions
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Sum of rewards over the episode
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    /// Whether the three sequences have the same length
    pub fn is_aligned(&self) -> bool {
        self.states.len() == self.rewards.len() && self.actions.len() == self.rewards.len()
    }

    /// Iterate the ticks as records
    pub fn records(&self) -> impl Iterator<Item = ObservationRecord> + '_ {
        self.states
            .iter()
            .zip(&self.actions)
            .zip(&self.rewards)
            .map(|((state, action), reward)| ObservationRecord {
                state: state.clone(),
                action: action.clone(),
                reward: *reward,
            })
    }
}
