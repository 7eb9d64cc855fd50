//! Submission controller
//!
//! Drives one registration from the form state to the webhook:
//! validate the passwords, resolve the target, build the multipart
//! payload, send it once and report a single outcome.

mod error;
mod session;
mod state;
mod transport;

pub use error::{
    CONNECTIVITY_MESSAGE, GENERIC_TRANSPORT_MESSAGE, SubmissionError, TransportError,
    TransportErrorKind, ValidationError,
};
pub use session::RegistrationSession;
pub use state::{SubmissionOutcome, SubmissionPreview, SubmissionState, SubmitAttempt};
pub use transport::{HttpTransport, WebhookResponse, WebhookTransport, into_form};
