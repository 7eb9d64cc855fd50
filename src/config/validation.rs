use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("HTTP timeout must be positive: {field} = 0")]
    InvalidTimeout { field: String },

    #[error("HTTP user agent must not be empty")]
    EmptyUserAgent,

    #[error("Known webhook identifier '{0}' must not contain '/'")]
    InvalidKnownIdentifier(String),
}

/// Validate the entire configuration
///
/// Webhook URLs are not checked here: a bad target is reported per
/// submission attempt, so the form stays usable.
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_http(config)?;
    validate_webhook(config)?;
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.user_agent.trim().is_empty() {
        return Err(ValidationError::EmptyUserAgent);
    }

    let timeouts = [
        ("connect_timeout_secs", config.http.connect_timeout_secs),
        ("request_timeout_secs", config.http.request_timeout_secs),
    ];

    for (field, value) in timeouts {
        if value == Some(0) {
            return Err(ValidationError::InvalidTimeout {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

fn validate_webhook(config: &Config) -> Result<(), ValidationError> {
    if let Some(id) = config.webhook.identifier() {
        if id.contains('/') {
            return Err(ValidationError::InvalidKnownIdentifier(id.to_string()));
        }
    }

    Ok(())
}
