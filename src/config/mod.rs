//! Configuration management for velric
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use velric::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Primary webhook: {}", config.webhook.primary_url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `VELRIC__<section>__<key>`
//!
//! Examples:
//! - `VELRIC__WEBHOOK__PRIMARY_URL=https://hooks.example.com/webhook/abc`
//! - `VELRIC__HTTP__REQUEST_TIMEOUT_SECS=30`
//!
//! The injected webhook override is read from `WEBHOOK_URL` (or
//! `VELRIC_WEBHOOK_URL`) and takes priority over every configured endpoint.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/velric.toml`.
//! This can be overridden using the `VELRIC_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    Config, DEFAULT_FALLBACK_URL, DEFAULT_KNOWN_IDENTIFIER, DEFAULT_PRIMARY_URL, HttpConfig,
    WebhookConfig,
};
pub use sources::apply_injected_webhook;
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Injected webhook override (`WEBHOOK_URL`)
    /// 2. Environment variables (`VELRIC__*`)
    /// 3. TOML file (default: `config/velric.toml`)
    /// 4. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
