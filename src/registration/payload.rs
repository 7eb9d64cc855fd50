//! Multipart payload for the registration webhook
//!
//! Field names are part of the receiver contract and must not change.
//! Scalar fields are always present, even when empty; `urls` and
//! `knowledgeBaseFiles` repeat once per entry and may be absent.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;

use super::models::RegistrationInput;
use crate::humanize::ByteSize;

/// Receiver field names
pub mod fields {
    pub const ORGANIZATION_NAME: &str = "organizationName";
    pub const INDUSTRY: &str = "industry";
    pub const EMAIL: &str = "email";
    pub const CONTACT: &str = "contact";
    pub const PASSWORD: &str = "password";
    pub const AGENT_TYPE: &str = "agentType";
    pub const AGREED: &str = "agreed";
    pub const SUBMITTED_AT: &str = "submittedAt";
    pub const URLS: &str = "urls";
    pub const KNOWLEDGE_BASE_FILES: &str = "knowledgeBaseFiles";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValue {
    Text(String),
    File {
        file_name: String,
        content: Bytes,
        mime: mime::Mime,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct PayloadField {
    pub name: &'static str,
    pub value: PayloadValue,
}

impl fmt::Debug for PayloadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("PayloadField");
        out.field("name", &self.name);
        if self.name == fields::PASSWORD {
            out.field("value", &"<redacted>");
        } else {
            out.field("value", &self.value);
        }
        out.finish()
    }
}

/// Ordered multipart fields built from one form snapshot
#[derive(Debug, Clone)]
pub struct RegistrationPayload {
    fields: Vec<PayloadField>,
    submitted_at: DateTime<Utc>,
}

impl RegistrationPayload {
    /// Build the payload, stamping `submittedAt` with the current time
    pub fn build(input: &RegistrationInput) -> Self {
        Self::build_at(input, Utc::now())
    }

    pub fn build_at(input: &RegistrationInput, submitted_at: DateTime<Utc>) -> Self {
        let text = |name, value: &str| PayloadField {
            name,
            value: PayloadValue::Text(value.to_string()),
        };

        let mut entries = vec![
            text(fields::ORGANIZATION_NAME, &input.organization_name),
            text(
                fields::INDUSTRY,
                input.industry.map(|i| i.as_str()).unwrap_or_default(),
            ),
            text(fields::EMAIL, &input.email),
            text(fields::CONTACT, &input.contact),
            text(fields::PASSWORD, &input.password),
            text(fields::AGENT_TYPE, input.agent_type.as_str()),
            text(fields::AGREED, if input.agreed { "true" } else { "false" }),
            text(
                fields::SUBMITTED_AT,
                &submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ];

        entries.extend(input.url_lines().into_iter().map(|url| text(fields::URLS, url)));

        entries.extend(input.attachments.iter().map(|attachment| PayloadField {
            name: fields::KNOWLEDGE_BASE_FILES,
            value: PayloadValue::File {
                file_name: attachment.name.clone(),
                content: attachment.content.clone(),
                mime: attachment.mime(),
            },
        }));

        Self {
            fields: entries,
            submitted_at,
        }
    }

    pub fn fields(&self) -> &[PayloadField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<PayloadField> {
        self.fields
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Number of fields with the given name
    pub fn count(&self, name: &str) -> usize {
        self.fields.iter().filter(|field| field.name == name).count()
    }

    /// All text values for a field name, in order
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.name == name)
            .filter_map(|field| match &field.value {
                PayloadValue::Text(value) => Some(value.as_str()),
                PayloadValue::File { .. } => None,
            })
            .collect()
    }

    /// First text value for a field name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts(name).into_iter().next()
    }

    /// Loggable view of the payload. The password is never included.
    pub fn summary(&self) -> PayloadSummary {
        let text = |name| self.text(name).unwrap_or_default().to_string();

        let files = self
            .fields
            .iter()
            .filter_map(|field| match &field.value {
                PayloadValue::File {
                    file_name,
                    content,
                    mime,
                } => Some(FileSummary {
                    name: file_name.clone(),
                    size: ByteSize::from(content.len()),
                    mime: mime.to_string(),
                }),
                PayloadValue::Text(_) => None,
            })
            .collect();

        PayloadSummary {
            organization_name: text(fields::ORGANIZATION_NAME),
            industry: text(fields::INDUSTRY),
            email: text(fields::EMAIL),
            contact: text(fields::CONTACT),
            agent_type: text(fields::AGENT_TYPE),
            agreed: text(fields::AGREED) == "true",
            submitted_at: text(fields::SUBMITTED_AT),
            urls: self
                .texts(fields::URLS)
                .into_iter()
                .map(str::to_string)
                .collect(),
            files,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadSummary {
    pub organization_name: String,
    pub industry: String,
    pub email: String,
    pub contact: String,
    pub agent_type: String,
    pub agreed: bool,
    pub submitted_at: String,
    pub urls: Vec<String>,
    pub files: Vec<FileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub size: ByteSize,
    pub mime: String,
}
