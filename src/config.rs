use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::read_to_string;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::integration::FailurePolicy;

pub const DEFAULT_DATABASE_PATH: &str = "forecasts.sqlite3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config from '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("Failed to parse toml from '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub problem: ProblemConfig,
    pub weather: WeatherApiConfig,
    pub exchange: ExchangeApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    /// Put the raw error message in the detail of 5xx responses. Handy on an
    /// internal network, leaks internals anywhere else.
    pub expose_internal_errors: bool,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        ProblemConfig {
            expose_internal_errors: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub default_city: String,
    pub on_failure: FailurePolicy,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        WeatherApiConfig {
            base_url: "https://api.openweathermap.org".to_string(),
            api_key: None,
            default_city: "Gothenburg".to_string(),
            on_failure: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub base_currency: String,
    /// Minimum absolute rate change before a new snapshot of a currency is
    /// stored. Unset means every fetched rate is stored.
    pub adjustment_threshold: Option<Decimal>,
    pub on_failure: FailurePolicy,
}

impl Default for ExchangeApiConfig {
    fn default() -> Self {
        ExchangeApiConfig {
            base_url: "https://open.er-api.com".to_string(),
            api_key: None,
            base_currency: "USD".to_string(),
            adjustment_threshold: None,
            on_failure: FailurePolicy::default(),
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str, path: &str) -> Result<Config, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Read the config file at `path`. A missing file yields the defaults so
    /// the service can start without any configuration.
    pub fn load(path: &str) -> Result<Config, ConfigError> {
        if !Path::new(path).exists() {
            log::info!("No config file at {}, using defaults", path);
            return Ok(Config::default());
        }
        let contents = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Config::from_toml(&contents, path)
    }
}
