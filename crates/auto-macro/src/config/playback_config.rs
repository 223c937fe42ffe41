use crate::config::{MAX_POLL_INTERVAL_MS, default_poll_interval_ms};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Playback tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How often a waiting playback checks for cancellation.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl PlaybackConfig {
    /// Polling tick, clamped to 1..=100 ms.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(1, MAX_POLL_INTERVAL_MS))
    }
}
