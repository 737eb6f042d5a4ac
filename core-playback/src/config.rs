//! # Playback Configuration
//!
//! Timings used by the playback controller.

use core_runtime::config::CoreConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How often the controller polls the session for position and duration
    /// once it is ready.
    ///
    /// Default: 500 ms.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Delay between the muted autoplay fallback and the unmute.
    ///
    /// Default: 200 ms.
    #[serde(default = "default_unmute_delay")]
    pub unmute_delay: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            unmute_delay: default_unmute_delay(),
        }
    }
}

impl PlaybackConfig {
    /// Take the playback timings from a validated core configuration.
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            unmute_delay: config.unmute_delay,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_unmute_delay(mut self, delay: Duration) -> Self {
        self.unmute_delay = delay;
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval.is_zero() {
            return Err("poll_interval must be > 0".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_unmute_delay() -> Duration {
    Duration::from_millis(200)
}
