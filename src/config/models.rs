use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed primary endpoint, used when nothing is injected
pub const DEFAULT_PRIMARY_URL: &str = "http://localhost:5678/webhook/velric";
/// Public tunnel endpoint, last in the priority chain
pub const DEFAULT_FALLBACK_URL: &str = "https://efc28561a29f.ngrok-free.app";
/// Webhook id appended when a target only names the host
pub const DEFAULT_KNOWN_IDENTIFIER: &str = "e9d3b15c-b5e2-48b0-8f47-b9334797dc09";

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Webhook target candidates, in priority order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    /// Injected override (highest priority). Also read from `WEBHOOK_URL`.
    #[serde(default)]
    pub override_url: Option<String>,
    #[serde(default = "default_primary_url")]
    pub primary_url: String,
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    /// Identifier for `/webhook/{id}` auto-completion; empty disables it
    #[serde(default = "default_known_identifier")]
    pub known_identifier: Option<String>,
}

impl WebhookConfig {
    /// Known identifier, if one is configured and non-blank
    pub fn identifier(&self) -> Option<&str> {
        self.known_identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            override_url: None,
            primary_url: default_primary_url(),
            fallback_url: default_fallback_url(),
            known_identifier: default_known_identifier(),
        }
    }
}

fn default_primary_url() -> String {
    DEFAULT_PRIMARY_URL.to_string()
}

fn default_fallback_url() -> String {
    DEFAULT_FALLBACK_URL.to_string()
}

fn default_known_identifier() -> Option<String> {
    Some(DEFAULT_KNOWN_IDENTIFIER.to_string())
}

/// Outbound HTTP client settings
///
/// Timeouts are unset by default, leaving worst-case latency to the
/// transport's own defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: None,
            request_timeout_secs: None,
        }
    }
}

fn default_user_agent() -> String {
    concat!("velric/", env!("CARGO_PKG_VERSION")).to_string()
}
