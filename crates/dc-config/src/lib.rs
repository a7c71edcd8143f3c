//! DentalCampus Configuration System
//!
//! TOML-based configuration with environment variable overrides.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub booking: BookingConfig,
    pub notifications: NotificationsConfig,

    /// Seed demo practitioners, schedules and cases on startup
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            booking: BookingConfig::default(),
            notifications: NotificationsConfig::default(),
            dev_mode: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Appointment booking policy
///
/// Clinic hours are wall-clock times (`HH:MM`). Bookable slots are cut from
/// `day_start` in steps of `slot_minutes` until `day_end`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub day_start: String,
    pub day_end: String,
    pub slot_minutes: u32,
    pub max_notes_len: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            day_start: "08:00".to_string(),
            day_end: "18:00".to_string(),
            slot_minutes: 60,
            max_notes_len: 2000,
        }
    }
}

impl BookingConfig {
    pub fn day_start_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_clock("booking.day_start", &self.day_start)
    }

    pub fn day_end_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_clock("booking.day_end", &self.day_end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let start = self.day_start_time()?;
        let end = self.day_end_time()?;
        if start >= end {
            return Err(ConfigError::ValidationError(format!(
                "booking.day_start ({}) must be before booking.day_end ({})",
                self.day_start, self.day_end
            )));
        }
        if self.slot_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "booking.slot_minutes must be at least 1".to_string(),
            ));
        }
        if i64::from(self.slot_minutes) > (end - start).num_minutes() {
            return Err(ConfigError::ValidationError(format!(
                "booking.slot_minutes ({}) does not fit in the clinic day",
                self.slot_minutes
            )));
        }
        Ok(())
    }
}

fn parse_clock(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ConfigError::ValidationError(format!("{key} must be HH:MM, got '{value}'")))
}

/// Notification emission settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// When false, transitions commit without producing notifications
    pub enabled: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::ValidationError("http.port must not be 0".to_string()));
        }
        self.booking.validate()
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# DentalCampus Configuration
# Environment variables (DENTALCAMPUS_*) override these settings

dev_mode = false

[http]
port = 8080
host = "0.0.0.0"
cors_origins = ["http://localhost:3000"]

[booking]
day_start = "08:00"
day_end = "18:00"
slot_minutes = 60
max_notes_len = 2000

[notifications]
enabled = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.booking.slot_minutes, 60);
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.booking.day_end, "18:00");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[booking]\nslot_minutes = 30\n").unwrap();
        assert_eq!(config.booking.slot_minutes, 30);
        assert_eq!(config.booking.day_start, "08:00");
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn test_inverted_clinic_day_rejected() {
        let mut config = AppConfig::default();
        config.booking.day_start = "18:00".to_string();
        config.booking.day_end = "08:00".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_slot_rejected() {
        let mut config = AppConfig::default();
        config.booking.slot_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_clock_rejected() {
        let mut config = AppConfig::default();
        config.booking.day_start = "8am".to_string();
        assert!(config.booking.day_start_time().is_err());
    }
}
