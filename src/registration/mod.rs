//! Registration form model and multipart payload construction
//!
//! ## Key Components
//!
//! - [`RegistrationInput`] - Form state owned by one registration session
//! - [`Attachment`] - Knowledge-base document selected for upload
//! - [`RegistrationDraft`] - TOML representation of a form, for the CLI
//! - [`RegistrationPayload`] - Multipart field list sent to the webhook

mod draft;
mod models;
mod payload;

pub use draft::{DraftError, RegistrationDraft};
pub use models::{AgentType, Attachment, AttachmentError, Industry, RegistrationInput};
pub use payload::{
    FileSummary, PayloadField, PayloadSummary, PayloadValue, RegistrationPayload, fields,
};
