//! Configuration loading and typed config structures for the Haven simulation.
//!
//! The canonical configuration lives in `haven-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use haven_creature::CreatureConfig;
use haven_shop::ShopConfig;
use haven_world::{InventoryConfig, SpawnTuning, WeatherTable};
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but failed validation.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// The first problem found.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `haven-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, starting zone).
    #[serde(default)]
    pub world: WorldConfig,

    /// Time scale and calendar.
    #[serde(default)]
    pub time: TimeConfig,

    /// Season-indexed weather probabilities.
    #[serde(default)]
    pub weather: WeatherTable,

    /// Rarity tiers and spawn multipliers.
    #[serde(default)]
    pub spawning: SpawnTuning,

    /// Creature growth and stat rates.
    #[serde(default)]
    pub creature: CreatureConfig,

    /// Service windows, customers, staff, and reputation.
    #[serde(default)]
    pub shop: ShopConfig,

    /// Container sizes and starting gold.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Frame loop settings for the engine binary.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty or whitespace-only string yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Check every section, failing on the first problem.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the section and problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::Invalid { reason };
        if self.world.start_location.trim().is_empty() {
            return Err(invalid("world.start_location must not be empty".to_owned()));
        }
        self.time.validate().map_err(|reason| invalid(format!("time: {reason}")))?;
        self.weather
            .validate()
            .map_err(|e| invalid(format!("weather: {e}")))?;
        self.spawning
            .validate()
            .map_err(|e| invalid(format!("spawning: {e}")))?;
        self.creature
            .validate()
            .map_err(|e| invalid(format!("creature: {e}")))?;
        self.shop.validate().map_err(|e| invalid(format!("shop: {e}")))?;
        self.engine
            .validate()
            .map_err(|reason| invalid(format!("engine: {reason}")))
    }
}

/// World-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Human-readable name for this save.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for every random stream.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Zone the player starts in.
    #[serde(default = "default_start_location")]
    pub start_location: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            start_location: default_start_location(),
        }
    }
}

fn default_world_name() -> String {
    "Haven".to_owned()
}

const fn default_seed() -> u64 {
    42
}

fn default_start_location() -> String {
    "cafe_grounds".to_owned()
}

/// Time scale and calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Real seconds per in-game hour (default: 30).
    #[serde(default = "default_real_seconds_per_game_hour")]
    pub real_seconds_per_game_hour: f64,

    /// Hour of day a new game starts at (default: 8).
    #[serde(default = "default_start_hour")]
    pub start_hour: f64,

    /// Days in each season (default: 7).
    #[serde(default = "default_days_per_season")]
    pub days_per_season: u32,

    /// Hour sleeping wakes at (default: 6).
    #[serde(default = "default_wake_hour")]
    pub wake_hour: f64,

    /// Largest real-time step one tick may simulate (default: 0.1 s).
    #[serde(default = "default_max_tick_seconds")]
    pub max_tick_seconds: f64,
}

impl TimeConfig {
    /// Game hours per real second.
    pub const fn scale(&self) -> f64 {
        1.0 / self.real_seconds_per_game_hour
    }

    fn validate(&self) -> Result<(), String> {
        if !self.real_seconds_per_game_hour.is_finite() || self.real_seconds_per_game_hour <= 0.0 {
            return Err("real_seconds_per_game_hour must be positive".to_owned());
        }
        if !(0.0..24.0).contains(&self.start_hour) {
            return Err("start_hour must be in [0, 24)".to_owned());
        }
        if !(0.0..24.0).contains(&self.wake_hour) {
            return Err("wake_hour must be in [0, 24)".to_owned());
        }
        if self.days_per_season == 0 {
            return Err("days_per_season must be at least 1".to_owned());
        }
        if !self.max_tick_seconds.is_finite() || self.max_tick_seconds <= 0.0 {
            return Err("max_tick_seconds must be positive".to_owned());
        }
        Ok(())
    }
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            real_seconds_per_game_hour: default_real_seconds_per_game_hour(),
            start_hour: default_start_hour(),
            days_per_season: default_days_per_season(),
            wake_hour: default_wake_hour(),
            max_tick_seconds: default_max_tick_seconds(),
        }
    }
}

const fn default_real_seconds_per_game_hour() -> f64 {
    30.0
}

const fn default_start_hour() -> f64 {
    8.0
}

const fn default_days_per_season() -> u32 {
    7
}

const fn default_wake_hour() -> f64 {
    6.0
}

const fn default_max_tick_seconds() -> f64 {
    0.1
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Frame loop settings for the engine binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Milliseconds between frames (default: 16).
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,

    /// Stop after this many frames (default: run until Ctrl-C).
    #[serde(default)]
    pub max_frames: Option<u64>,

    /// Multiply the clock scale, for fast headless runs.
    #[serde(default)]
    pub time_scale_boost: Option<f64>,

    /// Where the snapshot is written on exit (default: `haven-save.json`).
    #[serde(default = "default_save_path")]
    pub save_path: String,

    /// Save slot recorded in the snapshot (default: 1).
    #[serde(default = "default_slot")]
    pub slot: u32,
}

impl EngineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.frame_ms == 0 {
            return Err("frame_ms must be at least 1".to_owned());
        }
        if let Some(boost) = self.time_scale_boost
            && (!boost.is_finite() || boost <= 0.0)
        {
            return Err("time_scale_boost must be positive".to_owned());
        }
        if self.save_path.trim().is_empty() {
            return Err("save_path must not be empty".to_owned());
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_ms: default_frame_ms(),
            max_frames: None,
            time_scale_boost: None,
            save_path: default_save_path(),
            slot: default_slot(),
        }
    }
}

const fn default_frame_ms() -> u64 {
    16
}

fn default_save_path() -> String {
    "haven-save.json".to_owned()
}

const fn default_slot() -> u32 {
    1
}
