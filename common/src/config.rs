use serde::Deserialize;
use std::path::Path;

use crate::region::Region;
use crate::settings::{
    Settings, SettingsError, DEFAULT_CAPACITY, DEFAULT_INTERVAL_MS, DEFAULT_THRESHOLD,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Region to watch from startup. Usually set later via the control surface.
    #[serde(default)]
    pub region: Option<Region>,
    /// Start capturing immediately after startup.
    #[serde(default)]
    pub autostart: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            capacity: default_capacity(),
            interval_ms: default_interval_ms(),
            region: None,
            autostart: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CaptureConfig {
    pub fn settings(&self) -> Result<Settings, SettingsError> {
        Settings::new(self.capacity, self.threshold, self.interval_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Parse and validate. Out-of-range capture settings are rejected here so
    /// they never reach an engine.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.capture.settings()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid capture settings: {0}")]
    Invalid(#[from] SettingsError),
}

// Default value functions
fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}
fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}
fn default_log_level() -> String {
    "info".into()
}
