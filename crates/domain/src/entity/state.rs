//! Media-player state of a frame entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a frame is doing, as exposed on its entity.
///
/// `Unknown` only exists until the first successful read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    /// Slideshow advancing.
    Playing,
    /// Slideshow stopped on the current artwork (image duration 0).
    Paused,
    /// Frame asleep.
    Off,
    /// Cloud reports the frame offline, or setup could not complete.
    Unavailable,
    #[default]
    Unknown,
}

impl EntityState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Off => "off",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }

    /// `false` only for [`Unavailable`](Self::Unavailable).
    #[must_use]
    pub fn is_available(self) -> bool {
        self != Self::Unavailable
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_only_be_unavailable_when_unavailable() {
        assert!(!EntityState::Unavailable.is_available());
        assert!(EntityState::Off.is_available());
        assert!(EntityState::Unknown.is_available());
    }

    #[test]
    fn should_start_unknown() {
        assert_eq!(EntityState::default(), EntityState::Unknown);
    }

    #[test]
    fn should_use_the_same_name_for_display_and_serde() {
        for state in [
            EntityState::Playing,
            EntityState::Paused,
            EntityState::Off,
            EntityState::Unavailable,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
        let parsed: EntityState = serde_json::from_str("\"paused\"").unwrap();
        assert_eq!(parsed, EntityState::Paused);
    }
}
