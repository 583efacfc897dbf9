// src/config.rs
//! Configuration loading with file storage and CLI overrides

use crate::error::{RelayError, Result};
use crate::gps::codec::DEFAULT_UTC_OFFSET_HOURS;
use crate::relay::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub bind_address: String,
    pub http_port: u16,
    pub ws_port: u16,
    pub utc_offset_hours: i32,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub subscriber_queue_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 3000,
            ws_port: 3001,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            database_url: None,
            database_max_connections: 5,
            subscriber_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl RelayConfig {
    /// Load configuration from `path`, or from the user config file when no
    /// path is given. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_path = Self::get_config_path()?;
                if default_path.exists() {
                    Self::load_from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load from a JSON config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Self = serde_json::from_str(&contents).map_err(|e| {
            RelayError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save to a JSON config file, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Get the per-user config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| RelayError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("nmea-relay").join("config.json"))
    }

    /// Reject settings the listeners cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.http_port != 0 && self.http_port == self.ws_port {
            return Err(RelayError::Config(format!(
                "HTTP and WebSocket listeners cannot share port {}",
                self.http_port
            )));
        }

        if !(-23..=23).contains(&self.utc_offset_hours) {
            return Err(RelayError::Config(format!(
                "UTC offset {} is outside -23..=23 hours",
                self.utc_offset_hours
            )));
        }

        if self.subscriber_queue_capacity == 0 {
            return Err(RelayError::Config(
                "Subscriber queue capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.http_port)
    }

    pub fn ws_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.ws_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.ws_port, 3001);
        assert_eq!(config.utc_offset_hours, 7);
        assert_eq!(config.database_url, None);
        assert_eq!(config.subscriber_queue_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"http_port": 8080, "database_url": "sqlite://fixes.db"}"#).unwrap();

        let config = RelayConfig::load(Some(&path)).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.ws_port, 3001);
        assert_eq!(config.database_url.as_deref(), Some("sqlite://fixes.db"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = RelayConfig::default();
        config.utc_offset_hours = -5;
        config.save_to_file(&path).unwrap();

        assert_eq!(RelayConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let err = RelayConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn test_zero_queue_capacity_is_rejected() {
        let config = RelayConfig {
            subscriber_queue_capacity: 0,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shared_port_is_rejected() {
        let config = RelayConfig {
            ws_port: 3000,
            ..RelayConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
