use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// A configuration value that failed validation at load time.
#[derive(Debug, Error)]
#[error("config validation failed for '{field}': {message} (value: {value})")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: &'static str, value: impl ToString, message: &'static str) -> Self {
        Self {
            field,
            value: value.to_string(),
            message,
        }
    }
}

/// How the collector schedules outbound requests.
///
/// `WorkerPool` is the canonical mode: up to `max_workers` concurrent
/// fetches. `SequentialDelay` forces one request at a time with the
/// configured inter-dispatch delay, for when strict request ordering
/// matters more than throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStrategy {
    #[default]
    WorkerPool,
    SequentialDelay,
}

/// Settings for the outbound weather API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Mandatory User-Agent header value (met.no rejects anonymous clients).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// File paths for exchanging data with the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// JSON array of locations to collect for.
    #[serde(default = "default_input_locations")]
    pub input_locations: PathBuf,
    /// JSON array of collection results.
    #[serde(default = "default_output_results")]
    pub output_results: PathBuf,
    /// Directory of per-location reading history files.
    #[serde(default = "default_timeseries_dir")]
    pub timeseries_dir: PathBuf,
    /// Directory analysis results are written into.
    #[serde(default = "default_analysis_dir")]
    pub analysis_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Concurrent fetch workers, 1 to 20.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Sleep before each dispatch, used as a rate-limiting control.
    #[serde(default)]
    pub collection_delay_ms: u64,
    #[serde(default)]
    pub strategy: CollectionStrategy,
}

impl PerformanceConfig {
    pub fn collection_delay(&self) -> Duration {
        Duration::from_millis(self.collection_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: error, warn, info, debug, trace.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Validated tunables for the whole pipeline, loaded once and passed by
/// reference into the collector and analysis constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_base_url() -> String {
    "https://api.met.no/weatherapi/locationforecast/2.0/compact".to_string()
}

fn default_user_agent() -> String {
    "skywatch/0.1 (weather collection pipeline)".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_input_locations() -> PathBuf {
    PathBuf::from("data/integration/input_locations.json")
}

fn default_output_results() -> PathBuf {
    PathBuf::from("data/integration/output_weather.json")
}

fn default_timeseries_dir() -> PathBuf {
    PathBuf::from("data/intelligence/timeseries")
}

fn default_analysis_dir() -> PathBuf {
    PathBuf::from("data/intelligence/analysis")
}

fn default_max_workers() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            input_locations: default_input_locations(),
            output_results: default_output_results(),
            timeseries_dir: default_timeseries_dir(),
            analysis_dir: default_analysis_dir(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            collection_delay_ms: 0,
            strategy: CollectionStrategy::default(),
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

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            files: FilesConfig::default(),
            performance: PerformanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

impl Config {
    /// Load configuration from a JSON file, or defaults if no path is given.
    /// A missing or malformed file is an error; so is any invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api.base_url.is_empty() {
            return Err(ValidationError::new(
                "api.base_url",
                &self.api.base_url,
                "API base URL cannot be empty",
            ));
        }
        if self.api.user_agent.is_empty() {
            return Err(ValidationError::new(
                "api.user_agent",
                &self.api.user_agent,
                "User-Agent cannot be empty",
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ValidationError::new(
                "api.timeout_secs",
                self.api.timeout_secs,
                "API timeout must be positive",
            ));
        }
        if self.performance.max_workers == 0 {
            return Err(ValidationError::new(
                "performance.max_workers",
                self.performance.max_workers,
                "max workers must be positive",
            ));
        }
        if self.performance.max_workers > 20 {
            return Err(ValidationError::new(
                "performance.max_workers",
                self.performance.max_workers,
                "max workers must not exceed 20 (API rate limits)",
            ));
        }
        for (field, path) in [
            ("files.input_locations", &self.files.input_locations),
            ("files.output_results", &self.files.output_results),
            ("files.timeseries_dir", &self.files.timeseries_dir),
            ("files.analysis_dir", &self.files.analysis_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::new(
                    field,
                    path.display(),
                    "file path cannot be empty",
                ));
            }
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ValidationError::new(
                "logging.level",
                &self.logging.level,
                "log level must be one of: error, warn, info, debug, trace",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        config.validate().expect("defaults must validate");
        assert_eq!(
            config.api.base_url,
            "https://api.met.no/weatherapi/locationforecast/2.0/compact"
        );
        assert_eq!(config.performance.max_workers, 5);
        assert_eq!(config.performance.strategy, CollectionStrategy::WorkerPool);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn worker_count_bounds_are_enforced() {
        let mut config = Config::default();

        config.performance.max_workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("performance.max_workers"));

        config.performance.max_workers = 21;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not exceed 20"));

        for workers in [1, 5, 20] {
            config.performance.max_workers = workers;
            config.validate().expect("in-range worker count");
        }
    }

    #[test]
    fn empty_url_and_zero_timeout_are_rejected() {
        let mut config = Config::default();
        config.api.base_url.clear();
        assert!(config.validate().unwrap_err().to_string().contains("api.base_url"));

        let mut config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().unwrap_err().to_string().contains("timeout"));
    }

    #[test]
    fn empty_file_path_is_rejected() {
        let mut config = Config::default();
        config.files.output_results = PathBuf::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("files.output_results"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn load_without_path_uses_defaults() {
        let config = Config::load(None).expect("defaults load");
        assert_eq!(config.api.max_retries, 3);
    }

    #[test]
    fn load_parses_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"performance": {{"max_workers": 2, "strategy": "sequential_delay", "collection_delay_ms": 125}}}}"#
        )
        .expect("write config");

        let config = Config::load(Some(file.path())).expect("load config");
        assert_eq!(config.performance.max_workers, 2);
        assert_eq!(config.performance.strategy, CollectionStrategy::SequentialDelay);
        assert_eq!(config.performance.collection_delay(), Duration::from_millis(125));
        // Untouched sections fall back to defaults.
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn load_rejects_invalid_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"performance": {{"max_workers": 50}}}}"#).expect("write config");

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("max workers"));
    }

    #[test]
    fn load_fails_for_missing_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
