use bytes::Bytes;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::humanize::ByteSize;

const MIME_MSWORD: &str = "application/msword";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Industry choices offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Industry {
    Education,
    Healthcare,
    Retail,
    Government,
    Others,
}

impl Industry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Education => "education",
            Industry::Healthcare => "healthcare",
            Industry::Retail => "retail",
            Industry::Government => "government",
            Industry::Others => "others",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the organization's AI agent handles calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Inbound,
    Outbound,
    #[default]
    Hybrid,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Inbound => "inbound",
            AgentType::Outbound => "outbound",
            AgentType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Failed to read attachment {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Attachment path {} has no file name", .0.display())]
    NoFileName(PathBuf),
}

/// A selected knowledge-base document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content: Bytes,
}

impl Attachment {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a document from disk, keeping its file name
    pub async fn read(path: &Path) -> Result<Self, AttachmentError> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| AttachmentError::NoFileName(path.to_path_buf()))?;

        let content = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::new(name, content))
    }

    pub fn size(&self) -> ByteSize {
        ByteSize::from(self.content.len())
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// Whether the document is one of the accepted formats (PDF, DOC, DOCX, TXT)
    pub fn is_supported_format(&self) -> bool {
        matches!(
            self.extension().as_deref(),
            Some("pdf" | "doc" | "docx" | "txt")
        )
    }

    /// Content type for the multipart part
    pub fn mime(&self) -> mime::Mime {
        let known = match self.extension().as_deref() {
            Some("pdf") => Some(mime::APPLICATION_PDF),
            Some("txt") => Some(mime::TEXT_PLAIN_UTF_8),
            Some("doc") => MIME_MSWORD.parse().ok(),
            Some("docx") => MIME_DOCX.parse().ok(),
            _ => None,
        };
        known.unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }
}

/// Registration form state
///
/// Owned by a single session. `urls` is the raw textarea content, one
/// link per line.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationInput {
    pub organization_name: String,
    pub industry: Option<Industry>,
    pub email: String,
    pub contact: String,
    pub password: String,
    pub confirm_password: String,
    pub urls: String,
    pub attachments: Vec<Attachment>,
    pub agent_type: AgentType,
    pub agreed: bool,
}

impl RegistrationInput {
    /// Non-empty, trimmed lines of the URL textarea
    pub fn url_lines(&self) -> Vec<&str> {
        self.urls
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }

    /// Reset the form after a successful submission.
    /// The agent type selection is kept.
    pub fn clear(&mut self) {
        *self = Self {
            agent_type: self.agent_type,
            ..Self::default()
        };
    }
}

impl fmt::Debug for RegistrationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationInput")
            .field("organization_name", &self.organization_name)
            .field("industry", &self.industry)
            .field("email", &self.email)
            .field("contact", &self.contact)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("urls", &self.url_lines())
            .field(
                "attachments",
                &self.attachments.iter().map(|a| &a.name).collect::<Vec<_>>(),
            )
            .field("agent_type", &self.agent_type)
            .field("agreed", &self.agreed)
            .finish()
    }
}
