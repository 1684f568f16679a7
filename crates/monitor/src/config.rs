//! Monitor configuration

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use drowsiness::{Sensitivity, Thresholds};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use session_stats::WindowConfig;
use tracing::info;

use crate::ConfigError;

/// Prefix for environment overrides (`DROWSY__MONITOR__TICK_PERIOD_MS=500`)
pub const ENV_PREFIX: &str = "DROWSY";

/// Separator for nested environment keys (`DROWSY__MONITOR__THRESHOLDS__EAR_DANGER`)
pub const ENV_SEPARATOR: &str = "__";

/// Monitoring engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Frames in one simulated drowsiness cycle
    pub cycle_length_frames: u32,

    /// Drive loop period (milliseconds); one frame per tick
    pub tick_period_ms: u64,

    /// Trailing window for statistics (seconds)
    pub window_seconds: u64,

    /// Chart bucket width (seconds)
    pub bucket_seconds: u64,

    /// Classifier thresholds
    pub thresholds: Thresholds,

    /// Sensitivity preset; replaces `thresholds` when set
    pub sensitivity: Option<Sensitivity>,

    /// Seed for confidence jitter; entropy when absent
    pub jitter_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cycle_length_frames: 18,
            tick_period_ms: 1000,
            window_seconds: 60,
            bucket_seconds: 5,
            thresholds: Thresholds::default(),
            sensitivity: None,
            jitter_seed: None,
        }
    }
}

/// Validated, typed view of a [`MonitorConfig`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub cycle_length: NonZeroU32,
    pub tick_period: Duration,
    pub window: WindowConfig,
    pub thresholds: Thresholds,
}

impl MonitorConfig {
    /// Parse from a TOML string (no environment layer)
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from_str(source, ::config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Thresholds after applying the sensitivity preset
    pub fn effective_thresholds(&self) -> Thresholds {
        self.sensitivity
            .map(Sensitivity::thresholds)
            .unwrap_or(self.thresholds)
    }

    /// Check every field, failing on the first invalid one
    pub fn validate(&self) -> Result<EngineSettings, ConfigError> {
        let cycle_length = NonZeroU32::new(self.cycle_length_frames)
            .ok_or_else(|| ConfigError::invalid("cycle_length_frames", "must be greater than 0"))?;

        if self.tick_period_ms == 0 {
            return Err(ConfigError::invalid("tick_period_ms", "must be greater than 0"));
        }
        if self.window_seconds == 0 {
            return Err(ConfigError::invalid("window_seconds", "must be greater than 0"));
        }
        if self.bucket_seconds == 0 {
            return Err(ConfigError::invalid("bucket_seconds", "must be greater than 0"));
        }
        if self.bucket_seconds > self.window_seconds {
            return Err(ConfigError::invalid(
                "bucket_seconds",
                format!(
                    "{} exceeds window_seconds ({})",
                    self.bucket_seconds, self.window_seconds
                ),
            ));
        }

        let thresholds = self.effective_thresholds();
        validate_thresholds(&thresholds)?;

        let window = WindowConfig::new(
            Duration::from_secs(self.window_seconds),
            Duration::from_secs(self.bucket_seconds),
        )
        .map_err(|e| ConfigError::invalid("bucket_seconds", e.to_string()))?;

        Ok(EngineSettings {
            cycle_length,
            tick_period: Duration::from_millis(self.tick_period_ms),
            window,
            thresholds,
        })
    }
}

fn validate_thresholds(thresholds: &Thresholds) -> Result<(), ConfigError> {
    let unit = |field: &'static str, value: f64| {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(())
        } else {
            Err(ConfigError::invalid(field, format!("{value} is outside [0, 1]")))
        }
    };
    unit("thresholds.ear_warning", thresholds.ear_warning)?;
    unit("thresholds.ear_danger", thresholds.ear_danger)?;

    if thresholds.ear_danger > thresholds.ear_warning {
        return Err(ConfigError::invalid(
            "thresholds.ear_danger",
            format!(
                "{} is above ear_warning ({})",
                thresholds.ear_danger, thresholds.ear_warning
            ),
        ));
    }
    if !thresholds.pitch_warning.is_finite() || thresholds.pitch_warning < 0.0 {
        return Err(ConfigError::invalid(
            "thresholds.pitch_warning",
            format!("{} must be a non-negative angle", thresholds.pitch_warning),
        ));
    }
    Ok(())
}

/// Deserialize `T` from an optional TOML file layered under `DROWSY__*` env vars.
///
/// Keys nest on `__` from the root of `T`, so a `monitor` table inside `T` is
/// overridden through `DROWSY__MONITOR__<FIELD>`.
pub fn load_layered<T: DeserializeOwned>(path: Option<&Path>) -> Result<T, ConfigError> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        info!("Reading configuration from {}", path.display());
        builder = builder.add_source(::config::File::from(path).required(true));
    }
    builder = builder.add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    Ok(builder.build()?.try_deserialize()?)
}
