//! HTTP transport for the registration webhook

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::error::TransportError;
use crate::config::HttpConfig;
use crate::registration::{PayloadValue, RegistrationPayload};

/// Status and raw body of a webhook response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one registration payload to a webhook
///
/// Implementations must issue exactly one request per call and must not
/// retry.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        payload: RegistrationPayload,
    ) -> Result<WebhookResponse, TransportError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(&config.user_agent);

        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        payload: RegistrationPayload,
    ) -> Result<WebhookResponse, TransportError> {
        let form = into_form(payload)?;

        debug!(url, "Posting multipart registration");

        // Content-Type (with boundary) is derived from the form by reqwest
        let response = self.client.post(url).multipart(form).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(url, status, body_len = body.len(), "Webhook responded");

        Ok(WebhookResponse { status, body })
    }
}

/// Convert the payload into a reqwest multipart form, preserving field order
pub fn into_form(payload: RegistrationPayload) -> Result<Form, TransportError> {
    let mut form = Form::new();

    for field in payload.into_fields() {
        form = match field.value {
            PayloadValue::Text(value) => form.text(field.name, value),
            PayloadValue::File {
                file_name,
                content,
                mime,
            } => {
                let part = Part::bytes(content.to_vec())
                    .file_name(file_name)
                    .mime_str(mime.as_ref())
                    .map_err(|e| TransportError::other(format!("Invalid attachment type: {}", e)))?;
                form.part(field.name, part)
            }
        };
    }

    Ok(form)
}
