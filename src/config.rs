//! Configuration management for the `tenki` forecast cache
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and validates all settings before anything touches the network or disk.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenkiConfig {
    /// Remote source configuration
    #[serde(default)]
    pub source: SourceConfig,
    /// Forecast store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the region metadata directory
    #[serde(default = "default_area_url")]
    pub area_url: String,
    /// Base URL for per-region forecast payloads
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Forecast store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path
    #[serde(default = "default_store_path")]
    pub path: String,
}

/// Logging settings
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
fn default_area_url() -> String {
    "https://www.jma.go.jp/bosai/common/const/area.json".to_string()
}

fn default_forecast_base_url() -> String {
    "https://www.jma.go.jp/bosai/forecast/data/forecast".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_store_path() -> String {
    "forecasts.db".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            area_url: default_area_url(),
            forecast_base_url: default_forecast_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
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

impl Default for TenkiConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TenkiConfig {
    /// Load configuration from the default file location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::config_path().unwrap_or_else(|| PathBuf::from("tenki.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides with TENKI_ prefix, e.g. TENKI_STORE__PATH
        builder = builder.add_source(
            Environment::with_prefix("TENKI")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: TenkiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Default configuration file path under the platform config directory
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tenki").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        if self.source.timeout_seconds == 0 || self.source.timeout_seconds > 300 {
            anyhow::bail!("request timeout must be between 1 and 300 seconds");
        }

        for url in [&self.source.area_url, &self.source.forecast_base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("source URL must be a valid HTTP or HTTPS URL: {url}");
            }
        }

        if self.store.path.is_empty() {
            anyhow::bail!("store path cannot be empty");
        }

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            );
        }

        Ok(())
    }
}
