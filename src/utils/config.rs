use crate::algorithms::path::FilterMode;
use crate::core::{API_KEY_ENV_VAR, GEOLOCATION_ENDPOINT};
use crate::lookup::RetryPolicy;
use crate::validation::error::{GeocellError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How unresolved towers are dispatched to the geolocation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// One lookup at a time on the calling thread
    #[default]
    Sequential,
    /// Concurrent lookups on a worker pool capped by `max_workers`
    Parallel,
}

/// What the visualization payload shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Every tower and the full refinement path
    #[default]
    All,
    /// Only the fused estimate
    Estimate,
}

/// Geolocation service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Endpoint URL; `{key}` is replaced with the API key
    pub endpoint: String,
    /// API key, usually taken from the environment
    pub api_key: String,
    /// Total timeout per lookup request (milliseconds)
    pub timeout_ms: u64,
    /// Retries for transient failures
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further one (milliseconds)
    pub retry_backoff_ms: u64,
    /// Honour proxy settings from the environment
    pub use_system_proxy: bool,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            endpoint: GEOLOCATION_ENDPOINT.to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 200,
            use_system_proxy: true,
        }
    }
}

impl LookupConfig {
    /// Endpoint with the API key filled in
    pub fn request_url(&self) -> String {
        self.endpoint.replace("{key}", &self.api_key)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.retry_backoff_ms),
            backoff_multiplier: 2.0,
        }
    }
}

/// Settings for one estimator instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Neighbour inclusion rule for path refinement
    pub filter_mode: FilterMode,
    /// Content of the visualization payload
    pub display_mode: DisplayMode,
    /// Reorder resolved towers by decreasing signal strength before refinement
    pub sort_by_signal: bool,
    pub resolution_mode: ResolutionMode,
    /// Worker cap for parallel resolution
    pub max_workers: usize,
    /// Consult and fill the location cache
    pub use_cache: bool,
    pub lookup: LookupConfig,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Subset,
            display_mode: DisplayMode::All,
            sort_by_signal: false,
            resolution_mode: ResolutionMode::Sequential,
            max_workers: 8,
            use_cache: true,
            lookup: LookupConfig::default(),
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    #[error("I/O error: {message}")]
    Io { message: String },
    /// JSON serialization/deserialization error
    #[error("JSON error: {message}")]
    Serialization { message: String },
}

/// Configuration validation result
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl EstimatorConfig {
    /// Parse a configuration from JSON; absent fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ConfigError::Serialization {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            message: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            ConfigError::Serialization {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Take the API key from the environment unless one is already set
    pub fn with_env_api_key(mut self) -> Self {
        if self.lookup.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV_VAR) {
                self.lookup.api_key = key;
            }
        }
        self
    }

    /// Check parameter ranges
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.max_workers == 0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "max_workers".to_string(),
                value: self.max_workers.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.lookup.timeout_ms == 0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "lookup.timeout_ms".to_string(),
                value: self.lookup.timeout_ms.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        let endpoint = &self.lookup.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            errors.push(ConfigError::InvalidParameter {
                parameter: "lookup.endpoint".to_string(),
                value: self.lookup.endpoint.clone(),
                reason: "must be an http(s) URL".to_string(),
            });
        }

        if self.lookup.api_key.is_empty() {
            warnings.push(format!(
                "No API key configured; set {} or lookup.api_key",
                API_KEY_ENV_VAR
            ));
        }
        if self.resolution_mode == ResolutionMode::Sequential && self.max_workers > 1 {
            warnings.push("max_workers has no effect in sequential resolution mode".to_string());
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Validate and return the configuration, or the first error found
    pub fn validated(self) -> Result<Self> {
        let result = self.validate();
        for warning in &result.warnings {
            tracing::warn!("{}", warning);
        }
        match result.errors.into_iter().next() {
            Some(error) => Err(GeocellError::Config(error)),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = EstimatorConfig::default();
        let result = config.validate();
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        // no API key, sequential with several workers
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let json = r#"{
            "filter_mode": "intersection",
            "resolution_mode": "parallel",
            "lookup": {"timeout_ms": 500}
        }"#;
        let config = EstimatorConfig::from_json_str(json).unwrap();
        assert_eq!(config.filter_mode, FilterMode::Intersection);
        assert_eq!(config.resolution_mode, ResolutionMode::Parallel);
        assert_eq!(config.lookup.timeout_ms, 500);
        assert_eq!(config.lookup.max_retries, 2);
        assert_eq!(config.display_mode, DisplayMode::All);
        assert!(config.use_cache);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EstimatorConfig {
            max_workers: 0,
            ..EstimatorConfig::default()
        };
        let result = config.validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);

        match config.validated() {
            Err(GeocellError::Config(ConfigError::InvalidParameter { parameter, .. })) => {
                assert_eq!(parameter, "max_workers")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        assert!(matches!(
            EstimatorConfig::from_json_str("{not json"),
            Err(GeocellError::Config(ConfigError::Serialization { .. }))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let config = EstimatorConfig {
            sort_by_signal: true,
            display_mode: DisplayMode::Estimate,
            ..EstimatorConfig::default()
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = EstimatorConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            EstimatorConfig::from_file("/nonexistent/geocell.json"),
            Err(GeocellError::Config(ConfigError::Io { .. }))
        ));
    }

    #[test]
    fn test_request_url_and_retry_policy() {
        let lookup = LookupConfig {
            api_key: "abc".to_string(),
            retry_backoff_ms: 50,
            ..LookupConfig::default()
        };
        assert_eq!(
            lookup.request_url(),
            "https://www.googleapis.com/geolocation/v1/geolocate?key=abc"
        );
        let policy = lookup.retry_policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.initial_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_explicit_api_key_wins_over_env() {
        let config = EstimatorConfig {
            lookup: LookupConfig {
                api_key: "explicit".to_string(),
                ..LookupConfig::default()
            },
            ..EstimatorConfig::default()
        };
        assert_eq!(config.with_env_api_key().lookup.api_key, "explicit");
    }
}
