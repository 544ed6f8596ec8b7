//! Per-tick episode recording
//!
//! Each tick produces one [`ObservationRecord`] from the current world and
//! input. Records accumulate in an [`EpisodeBuffer`] until a flush drains
//! them as a whole [`Episode`].
//!
//! # Record schema
//!
//! Every record uses one canonical shape, tagged with
//! [`EPISODE_SCHEMA_VERSION`] at the episode level:
//!
//! - state: `[x, z, near_bench, near_sofa, near_bed]`
//! - action: `[move_direction, sit_action]`
//!
//! Flags for categories a scene does not contain, or has not unlocked yet,
//! are always 0.

mod buffer;
mod record;
mod sampler;

pub use buffer::{EpisodeBuffer, SharedEpisodeBuffer};
pub use record::{Episode, ObservationRecord};
pub use sampler::{proximity_flags, reward_for, sample};

/// Current schema version for stored episodes
pub const EPISODE_SCHEMA_VERSION: u32 = 1;

/// Names of the state vector entries, in order
pub const STATE_FIELDS: [&str; 5] = ["x", "z", "near_bench", "near_sofa", "near_bed"];

/// Names of the action vector entries, in order
pub const ACTION_FIELDS: [&str; 2] = ["move_direction", "sit_action"];
