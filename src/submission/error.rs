use std::fmt;
use thiserror::Error;

use crate::webhook::ConfigurationError;

/// Shown instead of the raw error when the webhook could not be reached at all
pub const CONNECTIVITY_MESSAGE: &str = "Network error: failed to reach the webhook. \
Common causes: a cross-origin (CORS) restriction, mixed content (an HTTPS client \
calling an HTTP webhook), or the webhook URL is unreachable. \
Run with RUST_LOG=debug for details.";

/// Shown when a transport failure carries no message
pub const GENERIC_TRANSPORT_MESSAGE: &str = "Failed to send to webhook";

/// Signature of a fetch-level failure in transport error text
const FAILED_TO_FETCH: &str = "failed to fetch";

/// Local form checks, run before anything else
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request never reached the webhook (DNS, refused, TLS, timeout)
    Connectivity,
    Other,
}

/// The request failed without a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    kind: TransportErrorKind,
    detail: String,
}

impl TransportError {
    pub fn connectivity(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Connectivity,
            detail: detail.into(),
        }
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Other,
            detail: detail.into(),
        }
    }

    /// Classify from error text alone. A "failed to fetch" signature
    /// (any case) marks a connectivity failure.
    pub fn classify(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if detail.to_ascii_lowercase().contains(FAILED_TO_FETCH) {
            Self::connectivity(detail)
        } else {
            Self::other(detail)
        }
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn is_connectivity(&self) -> bool {
        self.kind == TransportErrorKind::Connectivity
    }

    /// Raw low-level error text, for logs
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TransportErrorKind::Connectivity => f.write_str(CONNECTIVITY_MESSAGE),
            TransportErrorKind::Other if self.detail.trim().is_empty() => {
                f.write_str(GENERIC_TRANSPORT_MESSAGE)
            }
            TransportErrorKind::Other => f.write_str(&self.detail),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            TransportError::connectivity(err.to_string())
        } else {
            TransportError::classify(err.to_string())
        }
    }
}

/// Why a submission attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Webhook responded with {status}: {body}")]
    Server { status: u16, body: String },
}

impl SubmissionError {
    /// True when no request was sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SubmissionError::Validation(_) | SubmissionError::Configuration(_)
        )
    }
}
