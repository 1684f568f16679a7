//! Server settings

use std::path::Path;

use monitor::{load_layered, ConfigError, MonitorConfig};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// HTTP server and logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Max log level (`trace`, `debug`, `info`, `warn`, `error`)
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            metrics: true,
        }
    }
}

impl ServerConfig {
    /// Parsed log level, if valid
    pub fn level(&self) -> Option<Level> {
        self.log_level.parse().ok()
    }

    /// Parsed log level, or the field error naming `server.log_level`
    pub fn validate(&self) -> Result<Level, ConfigError> {
        self.level().ok_or_else(|| ConfigError::Invalid {
            field: "server.log_level",
            reason: format!("unknown level {:?}", self.log_level),
        })
    }
}

/// Complete settings for the binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
}

impl Settings {
    /// Load from an optional TOML file plus `DROWSY__SERVER__*` and
    /// `DROWSY__MONITOR__*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings: Settings = load_layered(path)?;
        settings.server.validate()?;
        settings.monitor.validate()?;
        Ok(settings)
    }
}
