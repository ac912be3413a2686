/// Service configuration loader - parses floodrisk.toml
///
/// Separates thresholds, cache backend choice and provider endpoints from
/// code, so bands can be tuned or a provider swapped without recompiling
/// the service. Every section is optional; anything omitted falls back to
/// the defaults below.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::thresholds::ThresholdTables;

pub const DEFAULT_CONFIG_PATH: &str = "floodrisk.toml";

/// One worker per upstream domain, so a report's three fetches never queue.
pub const MIN_FETCH_WORKERS: usize = 3;

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub thresholds: ThresholdTables,
    pub cache: CacheConfig,
    pub sources: SourcesConfig,
    pub aggregator: AggregatorSettings,
}

/// Which durable layer backs the reading cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory for the file backend.
    pub directory: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::File,
            directory: ".floodrisk-cache".to_string(),
        }
    }
}

/// Provider endpoints (Open-Meteo compatible APIs)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub weather_url: String,
    pub flood_url: String,
    pub elevation_url: String,
    /// Per-request HTTP timeout
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            weather_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            flood_url: "https://flood-api.open-meteo.com/v1/flood".to_string(),
            elevation_url: "https://api.open-meteo.com/v1/elevation".to_string(),
            timeout_secs: 10,
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    pub report_ttl_secs: u64,
    /// Upper bound on the fan-out barrier; a domain still outstanding then is unavailable.
    pub fetch_timeout_secs: u64,
    pub workers: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            report_ttl_secs: 300,
            fetch_timeout_secs: 15,
            workers: 3,
        }
    }
}

impl ServiceConfig {
    /// Rejects tables that would make the banding lookups ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.thresholds.precipitation;
        if !p.is_ascending() {
            return Err(ConfigError::Invalid(format!(
                "precipitation thresholds must ascend: light {} < moderate {} < heavy {} < extreme {}",
                p.light, p.moderate, p.heavy, p.extreme
            )));
        }
        let r = &self.thresholds.river;
        if r.warning_percentile >= r.danger_percentile {
            return Err(ConfigError::Invalid(format!(
                "river warning percentile {} must be below danger percentile {}",
                r.warning_percentile, r.danger_percentile
            )));
        }
        if self.aggregator.workers < MIN_FETCH_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "aggregator.workers must be at least {}, got {}",
                MIN_FETCH_WORKERS, self.aggregator.workers
            )));
        }
        // Abandoned fetches hold a worker until their HTTP timeout fires.
        if self.aggregator.fetch_timeout_secs <= self.sources.timeout_secs {
            return Err(ConfigError::Invalid(format!(
                "aggregator.fetch_timeout_secs ({}) must exceed sources.timeout_secs ({})",
                self.aggregator.fetch_timeout_secs, self.sources.timeout_secs
            )));
        }
        Ok(())
    }
}

/// Parses configuration from a TOML string and validates it.
pub fn parse_config(contents: &str, origin: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads configuration from an explicit path. The file must exist.
pub fn load_config_from<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path_str = path.as_ref().display().to_string();
    let contents = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    parse_config(&contents, &path_str)
}

/// Loads `floodrisk.toml` from the working directory, or defaults if it is absent.
pub fn load_config() -> Result<ServiceConfig, ConfigError> {
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config_from(DEFAULT_CONFIG_PATH)
    } else {
        tracing::info!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH);
        Ok(ServiceConfig::default())
    }
}
