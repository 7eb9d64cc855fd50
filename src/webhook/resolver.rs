use crate::config::WebhookConfig;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

const WEBHOOK_SEGMENT: &str = "/webhook/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Webhook URL is required")]
    MissingUrl,

    #[error("Webhook URL must start with http:// or https://")]
    InvalidScheme { url: String },
}

/// Which candidate produced the resolved target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookSource {
    Injected,
    Primary,
    Fallback,
}

impl fmt::Display for WebhookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WebhookSource::Injected => "injected",
            WebhookSource::Primary => "primary",
            WebhookSource::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Final webhook target for one submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedWebhook {
    pub url: String,
    pub source: WebhookSource,
    /// `/webhook/{id}` was appended; diagnostic only
    pub auto_completed: bool,
}

impl ResolvedWebhook {
    /// True when the target is plain `http://`
    pub fn is_plaintext(&self) -> bool {
        has_prefix_ignore_case(&self.url, "http://")
    }
}

/// Resolves the webhook target from configuration
pub struct WebhookResolver<'a> {
    config: &'a WebhookConfig,
}

impl<'a> WebhookResolver<'a> {
    pub fn new(config: &'a WebhookConfig) -> Self {
        Self { config }
    }

    /// Resolve the target URL
    ///
    /// Candidates are scanned in priority order and the first one that is
    /// non-empty after trimming wins. The scheme is checked before any
    /// path completion.
    pub fn resolve(&self) -> Result<ResolvedWebhook, ConfigurationError> {
        let candidates: [(WebhookSource, fn(&WebhookConfig) -> Option<&str>); 3] = [
            (WebhookSource::Injected, |c| c.override_url.as_deref()),
            (WebhookSource::Primary, |c| Some(c.primary_url.as_str())),
            (WebhookSource::Fallback, |c| Some(c.fallback_url.as_str())),
        ];

        let (source, url) = candidates
            .iter()
            .find_map(|(source, candidate)| {
                candidate(self.config)
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(|url| (*source, url))
            })
            .ok_or(ConfigurationError::MissingUrl)?;

        if !has_prefix_ignore_case(url, "http://") && !has_prefix_ignore_case(url, "https://") {
            return Err(ConfigurationError::InvalidScheme {
                url: url.to_string(),
            });
        }

        let resolved = match self.config.identifier() {
            Some(id) if !url.to_ascii_lowercase().contains(WEBHOOK_SEGMENT) => ResolvedWebhook {
                url: format!("{}{}{}", url.trim_end_matches('/'), WEBHOOK_SEGMENT, id),
                source,
                auto_completed: true,
            },
            _ => ResolvedWebhook {
                url: url.to_string(),
                source,
                auto_completed: false,
            },
        };

        Ok(resolved)
    }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
