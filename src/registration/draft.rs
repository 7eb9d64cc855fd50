use serde::de::value::StrDeserializer;
use serde::de::{Deserializer, IntoDeserializer};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::models::{AgentType, Attachment, AttachmentError, Industry, RegistrationInput};

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Failed to read draft {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid draft: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}

/// Form contents as written in a TOML draft file
///
/// ```toml
/// organization_name = "Acme Clinic"
/// industry = "healthcare"
/// email = "ops@acme.test"
/// contact = "+1 555 000 0000"
/// urls = """
/// https://acme.test/faq
/// https://acme.test/hours
/// """
/// files = ["docs/handbook.pdf"]
/// agent_type = "inbound"
/// agreed = true
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrationDraft {
    pub organization_name: String,
    /// `""` is the unselected state
    #[serde(deserialize_with = "industry_or_unselected")]
    pub industry: Option<Industry>,
    pub email: String,
    pub contact: String,
    pub password: String,
    pub confirm_password: String,
    pub urls: String,
    pub files: Vec<PathBuf>,
    pub agent_type: AgentType,
    pub agreed: bool,
}

impl fmt::Debug for RegistrationDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationDraft")
            .field("organization_name", &self.organization_name)
            .field("industry", &self.industry)
            .field("email", &self.email)
            .field("contact", &self.contact)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("urls", &self.urls)
            .field("files", &self.files)
            .field("agent_type", &self.agent_type)
            .field("agreed", &self.agreed)
            .finish()
    }
}

fn industry_or_unselected<'de, D>(deserializer: D) -> Result<Option<Industry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => {
            let value: StrDeserializer<'_, D::Error> = value.into_deserializer();
            Industry::deserialize(value).map(Some)
        }
    }
}

impl RegistrationDraft {
    pub fn from_path(path: &Path) -> Result<Self, DraftError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DraftError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, DraftError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load the listed files and produce the form state
    pub async fn into_input(self) -> Result<RegistrationInput, DraftError> {
        let mut attachments = Vec::with_capacity(self.files.len());
        for path in &self.files {
            attachments.push(Attachment::read(path).await?);
        }

        Ok(RegistrationInput {
            organization_name: self.organization_name,
            industry: self.industry,
            email: self.email,
            contact: self.contact,
            password: self.password,
            confirm_password: self.confirm_password,
            urls: self.urls,
            attachments,
            agent_type: self.agent_type,
            agreed: self.agreed,
        })
    }
}
