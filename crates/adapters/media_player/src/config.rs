//! Media-player integration configuration.

use std::time::Duration;

use serde::Deserialize;

/// What a failed sleep check says about a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepFallback {
    /// Any failure to read the sleep state means the frame is asleep.
    #[default]
    AssumeAsleep,
    /// Only an unreachable frame is asleep; other failures fail the poll.
    UnreachableOnly,
}

/// Configuration for the Meural media-player integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MediaPlayerConfig {
    /// Interval between polls of every frame, in seconds.
    pub scan_interval_secs: u64,
    /// Interpretation of a failed sleep check.
    pub sleep_fallback: SleepFallback,
}

impl Default for MediaPlayerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 10,
            sleep_fallback: SleepFallback::AssumeAsleep,
        }
    }
}

impl MediaPlayerConfig {
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }
}
