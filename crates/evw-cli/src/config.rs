//! Configuration management for the evw CLI
//!
//! Lookup order: `--config` / `EVW_CONFIG`, then `./evw.toml`, then
//! `<user config dir>/evw/config.toml`, then built-in defaults.

use std::path::{Path, PathBuf};

use evw_core::{CountWindowConfig, Resolution, SlidingWindowConfig, TimeWindowConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "evw.toml";

/// Commented default configuration written by `evw init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# evw configuration

[sensor]
width = 304               # grid columns
height = 240              # grid rows
camera_events = "right"   # substream to window
time_scale = 1000.0       # raw timestamp -> ms (recordings stamped in seconds)

[count]
num_events = 10           # events per batch

[time]
window_period = 10.0      # window duration (ms)
carry_trigger = true      # apply the event that closes a window to the next one
flush_final = true        # emit the last partial window at end of stream

[sliding]
initial_window_period = 300.0   # window duration (ms)
sliding_wdw = 100.0             # horizon advance per emission (ms)
time_buff = 100.0               # initial horizon past the first window (ms)
eviction = "last-writer"        # or "unconditional"
carry_trigger = true
flush_final = true
"#;

/// Sensor geometry and input selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Grid columns
    pub width: u32,
    /// Grid rows
    pub height: u32,
    /// Substream (camera) to process
    pub camera_events: String,
    /// Multiplier from raw timestamps to milliseconds
    pub time_scale: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            width: 304,
            height: 240,
            camera_events: "right".to_string(),
            time_scale: evw_core::SECONDS_TO_MILLIS,
        }
    }
}

/// Full CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvwConfig {
    /// Sensor settings
    pub sensor: SensorConfig,
    /// Fixed-count policy defaults
    pub count: CountWindowConfig,
    /// Fixed-time policy defaults
    pub time: TimeWindowConfig,
    /// Sliding policy defaults
    pub sliding: SlidingWindowConfig,
}

impl EvwConfig {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| CliError::config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Get the default user configuration file path
    pub fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::config("Could not determine config directory"))?;
        Ok(config_dir.join("evw").join("config.toml"))
    }

    /// Resolve the effective configuration
    pub fn resolve(explicit: Option<&Path>) -> CliResult<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(CliError::missing_resource(format!(
                    "config file {}",
                    path.display()
                )));
            }
            debug!("Using config {}", path.display());
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            debug!("Using config {}", local.display());
            return Self::load_from_file(&local);
        }

        if let Ok(user) = Self::default_config_path() {
            if user.exists() {
                debug!("Using config {}", user.display());
                return Self::load_from_file(&user);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validated sensor resolution
    pub fn resolution(&self) -> CliResult<Resolution> {
        Ok(Resolution::new(self.sensor.width, self.sensor.height)?)
    }
}
