//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `meural.toml` in the working directory (or the file named by
//! `MEURALD_CONFIG`). Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::PathBuf;

use meural_adapter_media_player::MediaPlayerConfig;
use meural_client::{ClientConfig, Credentials};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "meural.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account settings.
    pub meural: AccountConfig,
    /// Cloud and local API client settings.
    pub client: ClientConfig,
    /// Polling settings.
    pub media_player: MediaPlayerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Meural account configuration.
#[derive(Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account e-mail, used as the username.
    pub email: String,
    pub password: String,
    /// File holding the session token between runs.
    pub token_file: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the config file (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("MEURALD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MEURAL_EMAIL") {
            self.meural.email = val;
        }
        if let Some(val) = lookup("MEURAL_PASSWORD") {
            self.meural.password = val;
        }
        if let Some(val) = lookup("MEURAL_TOKEN_FILE") {
            self.meural.token_file = PathBuf::from(val);
        }
        if let Some(val) = lookup("MEURALD_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.meural.email.trim().is_empty() {
            return Err(ConfigError::Validation("meural.email must be set".to_string()));
        }
        if self.meural.password.is_empty() {
            return Err(ConfigError::Validation(
                "meural.password must be set".to_string(),
            ));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "client.timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Credentials exchanged for a session token.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.meural.email, &self.meural.password)
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("email", &self.email)
            .field("password", &"***")
            .field("token_file", &self.token_file)
            .finish()
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            token_file: PathBuf::from("meural.token"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "meurald=info,meural=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
