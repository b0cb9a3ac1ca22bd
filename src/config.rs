//! Configuration module
//!
//! Loaded from a TOML file (~/.config/cadenza-booking/config.toml by
//! default). Every section and field has a default, so a partial file
//! or no file at all still yields a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::availability::DEFAULT_WINDOW_MONTHS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub booking: BookingConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Marketplace backend connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the marketplace REST backend
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Booking behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Length of the bookable window in months
    pub window_months: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            window_months: DEFAULT_WINDOW_MONTHS,
        }
    }
}

/// Marketplace account used for submissions
///
/// Both fields unset means browse-only: availability and quotes work,
/// submission is refused as not signed in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub user_id: Option<i64>,
    pub bearer_token: Option<String>,
}

impl AuthConfig {
    pub fn is_configured(&self) -> bool {
        self.user_id.is_some() && self.bearer_token.is_some()
    }
}

/// Logging output
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "cadenza_booking=debug"
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Default config file location (~/.config/cadenza-booking/config.toml)
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza-booking")
        .join("config.toml")
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_file_parses_every_section() {
        let file = write_config(
            r#"
            [api]
            base_url = "https://api.cadenza.example"
            timeout_secs = 10

            [booking]
            window_months = 3

            [auth]
            user_id = 42
            bearer_token = "secret"

            [logging]
            level = "debug"
            json = true
            "#,
        );

        let cfg = AppConfig::load(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "https://api.cadenza.example");
        assert_eq!(cfg.api.timeout(), Duration::from_secs(10));
        assert_eq!(cfg.booking.window_months, 3);
        assert_eq!(cfg.auth.user_id, Some(42));
        assert!(cfg.auth.is_configured());
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let file = write_config(
            r#"
            [api]
            base_url = "https://api.cadenza.example"
            "#,
        );

        let cfg = AppConfig::load(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "https://api.cadenza.example");
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.booking.window_months, DEFAULT_WINDOW_MONTHS);
        assert_eq!(cfg.auth.user_id, None);
        assert!(!cfg.auth.is_configured());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let file = write_config("[api\nbase_url = ");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn token_without_user_is_not_configured() {
        let file = write_config(
            r#"
            [auth]
            bearer_token = "secret"
            "#,
        );
        let cfg = AppConfig::load(file.path()).unwrap();
        assert!(!cfg.auth.is_configured());
    }
}
