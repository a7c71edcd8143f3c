//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "dentalcampus.toml",
    "./config/config.toml",
    "/etc/dentalcampus/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup.
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup)?;
        config.validate()?;

        Ok(config)
    }

    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Some(path) = lookup("DENTALCAMPUS_CONFIG").map(PathBuf::from) {
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} has invalid value '{value}'")))
}

fn apply_overrides<F>(config: &mut AppConfig, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(val) = lookup("DENTALCAMPUS_HTTP_PORT") {
        config.http.port = parse_var("DENTALCAMPUS_HTTP_PORT", val)?;
    }
    if let Some(val) = lookup("DENTALCAMPUS_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("DENTALCAMPUS_CORS_ORIGINS") {
        config.http.cors_origins = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // Booking policy
    if let Some(val) = lookup("DENTALCAMPUS_BOOKING_DAY_START") {
        config.booking.day_start = val;
    }
    if let Some(val) = lookup("DENTALCAMPUS_BOOKING_DAY_END") {
        config.booking.day_end = val;
    }
    if let Some(val) = lookup("DENTALCAMPUS_BOOKING_SLOT_MINUTES") {
        config.booking.slot_minutes = parse_var("DENTALCAMPUS_BOOKING_SLOT_MINUTES", val)?;
    }

    // Notifications
    if let Some(val) = lookup("DENTALCAMPUS_NOTIFICATIONS_ENABLED") {
        config.notifications.enabled = parse_var("DENTALCAMPUS_NOTIFICATIONS_ENABLED", val)?;
    }

    // General
    if let Some(val) = lookup("DENTALCAMPUS_DEV_MODE") {
        config.dev_mode = val == "1" || val.eq_ignore_ascii_case("true");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dev_mode = true\n[http]\nport = 9191\n[booking]\nslot_minutes = 45").unwrap();

        let config = ConfigLoader::with_path(file.path()).load_with(vars(&[])).unwrap();
        assert_eq!(config.http.port, 9191);
        assert_eq!(config.booking.slot_minutes, 45);
        assert!(config.dev_mode);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9191").unwrap();

        let config = ConfigLoader::with_path(file.path())
            .load_with(vars(&[
                ("DENTALCAMPUS_HTTP_PORT", "7070"),
                ("DENTALCAMPUS_CORS_ORIGINS", "http://a.test, http://b.test"),
                ("DENTALCAMPUS_NOTIFICATIONS_ENABLED", "false"),
            ]))
            .unwrap();

        assert_eq!(config.http.port, 7070);
        assert_eq!(config.http.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(!config.notifications.enabled);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let result = ConfigLoader::with_path("/nonexistent/dentalcampus.toml")
            .load_with(vars(&[("DENTALCAMPUS_BOOKING_SLOT_MINUTES", "soon")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_override_that_breaks_policy_fails_validation() {
        let result = ConfigLoader::with_path("/nonexistent/dentalcampus.toml")
            .load_with(vars(&[("DENTALCAMPUS_BOOKING_DAY_END", "07:00")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nport = ").unwrap();

        let result = ConfigLoader::with_path(file.path()).load_with(vars(&[]));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
