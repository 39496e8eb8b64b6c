//! Client configuration.

use std::time::Duration;

use serde::Deserialize;

/// Default Meural cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.meural.com/v0/";

/// Settings shared by the cloud and local clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the cloud API. Paths are appended after a single `/`.
    pub base_url: String,
    /// Per-request timeout in seconds, for both cloud and local calls.
    pub timeout_secs: u64,
    /// How long a cloud-previewed item stays on the frame before it is
    /// deleted again, in seconds.
    pub preview_grace_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            preview_grace_secs: 120,
        }
    }
}

impl ClientConfig {
    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Grace period between a cloud preview and the deletion of its item.
    #[must_use]
    pub fn preview_grace(&self) -> Duration {
        Duration::from_secs(self.preview_grace_secs)
    }

    /// Full URL of a cloud API path.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.meural.com/v0/");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.preview_grace(), Duration::from_secs(120));
    }

    #[test]
    fn should_join_endpoint_with_single_slash() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint("devices/7/sync"),
            "https://api.meural.com/v0/devices/7/sync"
        );

        let config = ClientConfig {
            base_url: "http://127.0.0.1:9000".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoint("/authenticate"), "http://127.0.0.1:9000/authenticate");
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: ClientConfig = toml::from_str("preview_grace_secs = 30").unwrap();
        assert_eq!(config.preview_grace_secs, 30);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
