//! Configuration loading for peersync.
//!
//! Configuration is loaded from an optional TOML file. Every section and
//! field has a default, so an empty file is valid.

use peersync_session::SessionConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the peersync CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Session timing.
    #[serde(default)]
    pub session: SessionSection,
    /// Simulated source settings used by `watch`.
    #[serde(default)]
    pub simulation: SimulationSection,
}

/// Session timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    /// Milliseconds between ticks (default: 500).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Milliseconds to search before reporting peers found or idle (default: 3000).
    #[serde(default = "default_discovery_window_ms")]
    pub discovery_window_ms: u64,
}

/// Simulated source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSection {
    /// Number of simulated peers (default: 15).
    #[serde(default = "default_peers")]
    pub peers: usize,
    /// Largest per-tick progress step (default: 5).
    #[serde(default = "default_max_step")]
    pub max_step: u64,
    /// Seed for deterministic runs (default: random).
    pub seed: Option<u64>,
}

// Default value functions
fn default_tick_interval_ms() -> u64 {
    500
}

fn default_discovery_window_ms() -> u64 {
    3000
}

fn default_peers() -> usize {
    15
}

fn default_max_step() -> u64 {
    peersync_session::source::DEFAULT_MAX_STEP
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            discovery_window_ms: default_discovery_window_ms(),
        }
    }
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            peers: default_peers(),
            max_step: default_max_step(),
            seed: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionSection::default(),
            simulation: SimulationSection::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Session configuration described by the `[session]` section.
    ///
    /// Not validated here; `SyncSession::new` rejects zero durations.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_tick_interval(Duration::from_millis(self.session.tick_interval_ms))
            .with_discovery_window(Duration::from_millis(self.session.discovery_window_ms))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}
