//! Configuration Module
//! Resolves dashboard settings from defaults, an optional JSON file and the environment.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Remote CSV with the per-country CO2 / GDP panel.
pub const DEFAULT_DATA_SOURCE: &str = "https://drive.switch.ch/index.php/s/cxW0xrmQXdGL1VJ/download";
pub const DEFAULT_YEAR: i64 = 1964;

/// Env var naming a JSON config file.
pub const CONFIG_PATH_ENV: &str = "CO2_DASHBOARD_CONFIG";
const DATA_SOURCE_ENV: &str = "CO2_DATA_SOURCE";
const DEFAULT_YEAR_ENV: &str = "CO2_DEFAULT_YEAR";
const TIMEOUT_ENV: &str = "CO2_REQUEST_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// `http(s)://` URL or local CSV path.
    pub data_source: String,
    pub default_year: i64,
    /// No timeout when unset.
    pub request_timeout_secs: Option<u64>,
    pub window_width: f32,
    pub window_height: f32,
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_source: DEFAULT_DATA_SOURCE.to_string(),
            default_year: DEFAULT_YEAR,
            request_timeout_secs: None,
            window_width: 1400.0,
            window_height: 900.0,
            export_width: 1200,
            export_height: 800,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the file named by `CO2_DASHBOARD_CONFIG`, then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(path.trim()))?,
            _ => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply overrides looked up by env var name. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(source) = get(DATA_SOURCE_ENV) {
            self.data_source = source.trim().to_string();
        }
        if let Some(year) = get(DEFAULT_YEAR_ENV) {
            self.default_year = parse_value(DEFAULT_YEAR_ENV, &year)?;
        }
        if let Some(secs) = get(TIMEOUT_ENV) {
            self.request_timeout_secs = Some(parse_value(TIMEOUT_ENV, &secs)?);
        }

        Ok(self)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
