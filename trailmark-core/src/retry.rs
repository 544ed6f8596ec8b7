//! What a flush does when the store refuses an episode
//!
//! The default policy makes one store call, so a failed flush drops the
//! drained episode. Extra attempts wait `backoff`, then twice that, and so
//! on up to `backoff_cap`. Only transient store errors are retried.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TrailmarkError;

/// Highest doubling applied to `backoff`
const MAX_DOUBLINGS: u32 = 16;

/// Retry policy for one flush
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushRetryPolicy {
    /// Store calls per flush, the first one included
    pub attempts: usize,

    /// Wait after the first failed call
    #[serde(with = "humantime_serde")]
    pub backoff: Duration,

    /// No single wait exceeds this
    #[serde(with = "humantime_serde")]
    pub backoff_cap: Duration,
}

impl Default for FlushRetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(10),
        }
    }
}

impl FlushRetryPolicy {
    /// One store call; failures drop the episode
    pub fn single_attempt() -> Self {
        Self::default()
    }

    /// Up to `attempts` store calls, first waiting `backoff`
    pub fn with_attempts(attempts: usize, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
            ..Self::default()
        }
    }

    pub fn retries(&self) -> bool {
        self.attempts > 1
    }

    /// How long to wait after `failures` failed calls (1-indexed)
    pub fn wait_after(&self, failures: usize) -> Duration {
        let doublings = failures.saturating_sub(1).min(MAX_DOUBLINGS as usize) as u32;
        self.backoff
            .saturating_mul(1 << doublings)
            .min(self.backoff_cap)
    }
}

impl TrailmarkError {
    /// Whether storing the same episode again could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, TrailmarkError::Storage(_) | TrailmarkError::Io(_))
    }
}
