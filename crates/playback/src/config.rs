//! Playback configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for route playback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Time between playback ticks in milliseconds
    pub cadence_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self { cadence_ms: 500 }
    }
}

impl PlaybackConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let cadence_ms = std::env::var("PLAYBACK_CADENCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&ms: &u64| ms > 0)
            .unwrap_or(500);

        Self { cadence_ms }
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms.max(1))
    }
}
