use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "VELRIC_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/velric.toml";
const ENV_PREFIX: &str = "VELRIC";
const ENV_SEPARATOR: &str = "__";

/// Injected webhook override variables, checked in order
const WEBHOOK_OVERRIDE_VARS: &[&str] = &["WEBHOOK_URL", "VELRIC_WEBHOOK_URL"];

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = load_from_sources(config_path)?;

    apply_injected_webhook(&mut config, |key| env::var(key).ok());

    Ok(config)
}

/// Apply the externally injected webhook URL, which only ever comes from the
/// process environment and wins over anything in the config file.
pub fn apply_injected_webhook<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let injected = WEBHOOK_OVERRIDE_VARS
        .iter()
        .find_map(|key| lookup(key).filter(|value| !value.trim().is_empty()));

    if let Some(url) = injected {
        tracing::debug!("Using injected webhook override from environment");
        config.webhook.override_url = Some(url);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // VELRIC__WEBHOOK__PRIMARY_URL -> webhook.primary_url
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::super::models::{DEFAULT_FALLBACK_URL, DEFAULT_PRIMARY_URL};
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.webhook.primary_url, DEFAULT_PRIMARY_URL);
        assert_eq!(config.webhook.fallback_url, DEFAULT_FALLBACK_URL);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[webhook]
primary_url = "https://hooks.example.com/webhook/abc"
known_identifier = ""

[http]
user_agent = "velric-test"
request_timeout_secs = 30
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.webhook.primary_url, "https://hooks.example.com/webhook/abc");
        assert_eq!(config.webhook.fallback_url, DEFAULT_FALLBACK_URL);
        assert_eq!(config.webhook.identifier(), None);
        assert_eq!(config.http.user_agent, "velric-test");
        assert_eq!(config.http.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_injected_webhook_wins() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> =
            HashMap::from([("WEBHOOK_URL", "https://injected.example.com")]);

        apply_injected_webhook(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.webhook.override_url.as_deref(),
            Some("https://injected.example.com")
        );
    }

    #[test]
    fn test_injected_webhook_alias_and_blank_values() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("WEBHOOK_URL", "   "),
            ("VELRIC_WEBHOOK_URL", "https://alias.example.com"),
        ]);

        apply_injected_webhook(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.webhook.override_url.as_deref(),
            Some("https://alias.example.com")
        );
    }

    #[test]
    fn test_no_injected_webhook_keeps_file_value() {
        let mut config = Config::default();
        config.webhook.override_url = Some("https://from-file.example.com".to_string());

        apply_injected_webhook(&mut config, |_| None);

        assert_eq!(
            config.webhook.override_url.as_deref(),
            Some("https://from-file.example.com")
        );
    }
}
