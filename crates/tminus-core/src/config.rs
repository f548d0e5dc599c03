use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "TMINUS_CONFIG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// All errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote launch provider settings
    #[serde(default)]
    pub launch_api: LaunchApiConfig,

    /// Pad weather enrichment settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Refresh scheduling and retention
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Local launch database
    #[serde(default)]
    pub store: StoreConfig,

    /// Default list filters
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchApiConfig {
    /// Launch Library 2 base URL, including the API version
    pub base_url: String,

    /// Result collection path relative to `base_url`
    #[serde(default = "default_launch_endpoint")]
    pub endpoint: String,

    /// Page size requested from the provider
    #[serde(default = "default_launch_limit")]
    pub limit: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport retries for timeouts, connection failures and 5xx responses
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

fn default_launch_endpoint() -> String {
    "launch/upcoming/".to_string()
}

fn default_launch_limit() -> u32 {
    50
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_retry_delay_ms() -> u64 {
    500
}

fn default_max_retry_delay_ms() -> u64 {
    5000
}

impl Default for LaunchApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ll.thespacedevs.com/2.2.0".to_string(),
            endpoint: default_launch_endpoint(),
            limit: default_launch_limit(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Look up hourly pad weather for each launch
    pub enabled: bool,

    /// Open-Meteo base URL
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.open-meteo.com".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Minutes between refresh cycles
    pub interval_minutes: u32,

    /// Delete launches whose NET is older than this many days. Disabled when unset.
    #[serde(default)]
    pub prune_after_days: Option<u32>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
            prune_after_days: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tminus")
        .join("launches.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Country code the list view restricts to by default (e.g. "USA")
    #[serde(default)]
    pub default_country_code: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            default_country_code: Some("USA".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there when missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.launch_api.base_url, "launch_api.base_url", &mut result);
        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.launch_api.endpoint.trim().is_empty() {
            result.add_error("launch_api.endpoint", "Endpoint must not be empty");
        }

        if self.launch_api.limit == 0 {
            result.add_error("launch_api.limit", "Limit must be greater than 0");
        } else if self.launch_api.limit > 100 {
            result.add_warning(
                "launch_api.limit",
                "Launch Library caps page size at 100; larger limits are truncated",
            );
        }

        if self.launch_api.timeout_secs == 0 {
            result.add_error("launch_api.timeout_secs", "Timeout must be greater than 0");
        }
        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }

        if self.launch_api.initial_retry_delay_ms > self.launch_api.max_retry_delay_ms {
            result.add_warning(
                "launch_api.initial_retry_delay_ms",
                "Initial retry delay exceeds the maximum delay; every retry uses the maximum",
            );
        }

        if self.refresh.interval_minutes == 0 {
            result.add_error(
                "refresh.interval_minutes",
                "Refresh interval must be greater than 0",
            );
        } else if self.refresh.interval_minutes < 5 {
            // Launch Library's free tier allows 15 requests per hour.
            result.add_warning(
                "refresh.interval_minutes",
                "Refreshing more often than every 5 minutes will hit provider rate limits",
            );
        }

        if self.refresh.prune_after_days == Some(0) {
            result.add_warning(
                "refresh.prune_after_days",
                "Pruning after 0 days deletes every past launch on each refresh",
            );
        }

        if !self.weather.enabled {
            result.add_warning("weather.enabled", "Pad weather enrichment is disabled");
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Path of the configuration file, honouring `TMINUS_CONFIG`
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("tminus");

        Ok(config_dir.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = Config::default();
        let result = config.validate();
        assert!(result.is_valid(), "Default config should be valid: {:?}", result.errors);
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.launch_api.base_url = "not-a-url".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "launch_api.base_url"));
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.weather.base_url = "ftp://api.open-meteo.com".to_string();
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.message.contains("http or https")));
    }

    #[test]
    fn test_zero_limit_and_interval() {
        let mut config = Config::default();
        config.launch_api.limit = 0;
        config.refresh.interval_minutes = 0;
        let result = config.validate();
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.field == "launch_api.limit"));
        assert!(result.errors.iter().any(|e| e.field == "refresh.interval_minutes"));
    }

    #[test]
    fn test_short_interval_is_warning() {
        let mut config = Config::default();
        config.refresh.interval_minutes = 1;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "refresh.interval_minutes"));
    }

    #[test]
    fn test_disabled_weather_is_warning() {
        let mut config = Config::default();
        config.weather.enabled = false;
        let result = config.validate();
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.field == "weather.enabled"));
    }

    #[test]
    fn test_validation_result_error_summary() {
        let mut result = ValidationResult::default();
        result.add_error("field1", "error1");
        result.add_error("field2", "error2");
        let summary = result.error_summary();
        assert!(summary.contains("field1"));
        assert!(summary.contains("field2"));
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.launch_api.limit, 50);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.launch_api.base_url, config.launch_api.base_url);
        assert_eq!(reloaded.filters.default_country_code.as_deref(), Some("USA"));
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[refresh]\ninterval_minutes = 30\nprune_after_days = 14\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.refresh.interval_minutes, 30);
        assert_eq!(config.refresh.prune_after_days, Some(14));
        assert!(config.weather.enabled);
        assert_eq!(config.launch_api.endpoint, "launch/upcoming/");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[refresh\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
