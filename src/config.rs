//! Configuration management for `fairmeet`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::FairmeetError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for `fairmeet`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FairmeetConfig {
    /// TfL Unified API configuration
    #[serde(default)]
    pub tfl: TflConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Optimizer tuning
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TfL Unified API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TflConfig {
    /// Registered application id (optional, raises rate limits)
    pub app_id: Option<String>,
    /// Registered application key (optional, raises rate limits)
    pub app_key: Option<String>,
    /// Base URL for the TfL Unified API
    #[serde(default = "default_tfl_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_tfl_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_tfl_max_retries")]
    pub max_retries: u32,
    /// How long cached journey quotes stay valid, in minutes
    #[serde(default = "default_journey_ttl")]
    pub journey_ttl_minutes: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Optimizer tuning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Weight of the fairness penalty in [0, 1]
    #[serde(default = "default_fairness_weight")]
    pub fairness_weight: f64,
    /// Candidate cap before the geographic pre-filter kicks in
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    /// Maximum concurrent journey quote requests
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Candidate search radius around the group centroid, in meters
    #[serde(default = "default_search_radius")]
    pub search_radius_m: u32,
    /// Maximum number of venues the candidate generator proposes
    #[serde(default = "default_max_venues")]
    pub max_venues: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_tfl_base_url() -> String {
    "https://api.tfl.gov.uk".to_string()
}

fn default_tfl_timeout() -> u32 {
    30
}

fn default_tfl_max_retries() -> u32 {
    3
}

fn default_journey_ttl() -> u32 {
    60
}

fn default_cache_location() -> String {
    "~/.cache/fairmeet".to_string()
}

fn default_fairness_weight() -> f64 {
    0.5
}

fn default_max_candidates() -> usize {
    10
}

fn default_concurrency() -> usize {
    8
}

fn default_search_radius() -> u32 {
    1500
}

fn default_max_venues() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TflConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_key: None,
            base_url: default_tfl_base_url(),
            timeout_seconds: default_tfl_timeout(),
            max_retries: default_tfl_max_retries(),
            journey_ttl_minutes: default_journey_ttl(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            fairness_weight: default_fairness_weight(),
            max_candidates: default_max_candidates(),
            concurrency: default_concurrency(),
            search_radius_m: default_search_radius(),
            max_venues: default_max_venues(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl FairmeetConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Env overrides like FAIRMEET_TFL__APP_KEY; "__" separates nesting
        // levels and field names keep their single underscores
        builder = builder.add_source(
            Environment::with_prefix("FAIRMEET")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: FairmeetConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fairmeet").join("config.toml"))
    }

    /// Cache directory with a leading `~` expanded to the home directory
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        if let Some(stripped) = self.cache.location.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        PathBuf::from(&self.cache.location)
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.tfl.base_url.is_empty() {
            self.tfl.base_url = default_tfl_base_url();
        }
        if self.tfl.timeout_seconds == 0 {
            self.tfl.timeout_seconds = default_tfl_timeout();
        }
        if self.tfl.journey_ttl_minutes == 0 {
            self.tfl.journey_ttl_minutes = default_journey_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.optimizer.max_candidates == 0 {
            self.optimizer.max_candidates = default_max_candidates();
        }
        if self.optimizer.concurrency == 0 {
            self.optimizer.concurrency = default_concurrency();
        }
        if self.optimizer.search_radius_m == 0 {
            self.optimizer.search_radius_m = default_search_radius();
        }
        if self.optimizer.max_venues == 0 {
            self.optimizer.max_venues = default_max_venues();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API credentials
    pub fn validate_credentials(&self) -> Result<()> {
        // Both credentials are optional; the TfL API accepts anonymous
        // requests at a lower rate limit.
        if let Some(app_key) = &self.tfl.app_key {
            if app_key.is_empty() {
                return Err(FairmeetError::config(
                    "TfL app key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if app_key.len() < 8 {
                return Err(FairmeetError::config(
                    "TfL app key appears to be invalid (too short). Please check your credentials.",
                )
                .into());
            }

            if app_key.len() > 100 {
                return Err(FairmeetError::config(
                    "TfL app key appears to be invalid (too long). Please check your credentials.",
                )
                .into());
            }
        }

        if let Some(app_id) = &self.tfl.app_id {
            if app_id.is_empty() {
                return Err(FairmeetError::config(
                    "TfL app id cannot be empty if provided. Either remove it or provide a valid id.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.tfl.timeout_seconds > 300 {
            return Err(FairmeetError::config("TfL API timeout cannot exceed 300 seconds").into());
        }

        if self.tfl.max_retries > 10 {
            return Err(FairmeetError::config("TfL API max retries cannot exceed 10").into());
        }

        if self.tfl.journey_ttl_minutes > 1440 {
            return Err(
                FairmeetError::config("Journey quote TTL cannot exceed 1440 minutes (1 day)")
                    .into(),
            );
        }

        if !(0.0..=1.0).contains(&self.optimizer.fairness_weight) {
            return Err(
                FairmeetError::config("Fairness weight must be between 0.0 and 1.0").into(),
            );
        }

        if self.optimizer.max_candidates > 100 {
            return Err(FairmeetError::config("Candidate cap cannot exceed 100").into());
        }

        if self.optimizer.concurrency > 64 {
            return Err(
                FairmeetError::config("Concurrent quote requests cannot exceed 64").into(),
            );
        }

        if self.optimizer.search_radius_m > 50_000 {
            return Err(
                FairmeetError::config("Search radius cannot exceed 50000 meters").into(),
            );
        }

        if self.optimizer.max_venues > 100 {
            return Err(FairmeetError::config("Maximum venues cannot exceed 100").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(FairmeetError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(FairmeetError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.tfl.base_url.starts_with("http://") && !self.tfl.base_url.starts_with("https://")
        {
            return Err(
                FairmeetError::config("TfL API base URL must be a valid HTTP or HTTPS URL").into(),
            );
        }

        Ok(())
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let fairmeet_config_dir = config_dir.join("fairmeet");
            std::fs::create_dir_all(&fairmeet_config_dir).with_context(|| {
                format!(
                    "Failed to create config directory: {}",
                    fairmeet_config_dir.display()
                )
            })?;
            Ok(fairmeet_config_dir)
        } else {
            Err(FairmeetError::config("Unable to determine config directory").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = FairmeetConfig::default();
        assert_eq!(config.tfl.base_url, "https://api.tfl.gov.uk");
        assert_eq!(config.tfl.timeout_seconds, 30);
        assert_eq!(config.tfl.journey_ttl_minutes, 60);
        assert_eq!(config.optimizer.fairness_weight, 0.5);
        assert_eq!(config.optimizer.max_candidates, 10);
        assert_eq!(config.optimizer.concurrency, 8);
        assert_eq!(config.optimizer.search_radius_m, 1500);
        assert_eq!(config.logging.level, "info");
        assert!(config.tfl.app_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_credentials() {
        let config = FairmeetConfig::default();
        // Credentials are optional for anonymous access
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_config_validation_valid_app_key() {
        let mut config = FairmeetConfig::default();
        config.tfl.app_key = Some("valid_app_key_123".to_string());
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_config_validation_short_app_key() {
        let mut config = FairmeetConfig::default();
        config.tfl.app_key = Some("short".to_string());
        let result = config.validate_credentials();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = FairmeetConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = FairmeetConfig::default();
        config.tfl.timeout_seconds = 500; // Invalid - too high
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("timeout cannot exceed")
        );
    }

    #[test]
    fn test_config_validation_fairness_weight_range() {
        let mut config = FairmeetConfig::default();
        config.optimizer.fairness_weight = 1.5;
        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Fairness weight")
        );
    }

    #[test]
    fn test_environment_variable_override() {
        // SAFETY: Test environment, setting test values only
        unsafe {
            env::set_var("FAIRMEET_TFL__APP_KEY", "test_key_from_env");
            env::set_var("FAIRMEET_OPTIMIZER__MAX_CANDIDATES", "7");
        }

        // A path that does not exist keeps the file source out of the way
        let loaded =
            FairmeetConfig::load_from_path(Some(PathBuf::from("/nonexistent/fairmeet.toml")));

        // SAFETY: Test cleanup
        unsafe {
            env::remove_var("FAIRMEET_TFL__APP_KEY");
            env::remove_var("FAIRMEET_OPTIMIZER__MAX_CANDIDATES");
        }

        let config = loaded.unwrap();
        assert_eq!(config.tfl.app_key, Some("test_key_from_env".to_string()));
        assert_eq!(config.optimizer.max_candidates, 7);
    }

    #[test]
    fn test_config_path_generation() {
        let path = FairmeetConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("fairmeet"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_cache_path_expands_home() {
        let config = FairmeetConfig::default();
        let path = config.cache_path();
        assert!(path.to_string_lossy().ends_with(".cache/fairmeet"));
        assert!(!path.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_apply_defaults_fills_empty_fields() {
        let mut config = FairmeetConfig::default();
        config.tfl.base_url = String::new();
        config.optimizer.concurrency = 0;
        config.apply_defaults();
        assert_eq!(config.tfl.base_url, "https://api.tfl.gov.uk");
        assert_eq!(config.optimizer.concurrency, 8);
    }
}
