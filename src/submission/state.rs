use serde::Serialize;
use std::fmt;

use super::error::SubmissionError;
use crate::registration::PayloadSummary;
use crate::webhook::ResolvedWebhook;

/// Result of one submission attempt. Exactly one per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success { status: u16, body: String },
    Failure { reason: SubmissionError },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    /// Text shown to the user
    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::Success { status, body } if body.is_empty() => {
                format!("Registration sent successfully. Server response: {}", status)
            }
            SubmissionOutcome::Success { status, body } => format!(
                "Registration sent successfully. Server response: {} — {}",
                status, body
            ),
            SubmissionOutcome::Failure { reason } => reason.to_string(),
        }
    }
}

impl From<SubmissionError> for SubmissionOutcome {
    fn from(reason: SubmissionError) -> Self {
        SubmissionOutcome::Failure { reason }
    }
}

/// Submission state machine
///
/// `Validating`, `Resolving` and `Building` run synchronously inside
/// `submit`; only `Idle` and `Sending` are observable between calls.
/// The last outcome lives inside `Idle`, so a success and an error
/// message can never be shown together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle { last: Option<SubmissionOutcome> },
    Validating,
    Resolving,
    Building,
    Sending { target: ResolvedWebhook },
}

impl Default for SubmissionState {
    fn default() -> Self {
        SubmissionState::Idle { last: None }
    }
}

impl SubmissionState {
    /// A submission is underway; new triggers are ignored
    pub fn is_pending(&self) -> bool {
        !matches!(self, SubmissionState::Idle { .. })
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        match self {
            SubmissionState::Idle { last } => last.as_ref(),
            _ => None,
        }
    }

    /// Success text for display, if the last attempt succeeded
    pub fn result_message(&self) -> Option<String> {
        self.last_outcome()
            .filter(|outcome| outcome.is_success())
            .map(SubmissionOutcome::message)
    }

    /// Error text for display, if the last attempt failed
    pub fn error_message(&self) -> Option<String> {
        self.last_outcome()
            .filter(|outcome| !outcome.is_success())
            .map(SubmissionOutcome::message)
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Idle { .. } => "idle",
            SubmissionState::Validating => "validating",
            SubmissionState::Resolving => "resolving",
            SubmissionState::Building => "building",
            SubmissionState::Sending { .. } => "sending",
        };
        f.write_str(name)
    }
}

/// What a submit trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Another submission was in flight; nothing was sent
    Ignored,
    Finished(SubmissionOutcome),
}

/// Everything a submission would send, without sending it
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPreview {
    pub target: ResolvedWebhook,
    pub payload: PayloadSummary,
}
