//! Registration session: form state plus the submission controller

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

use super::error::{SubmissionError, ValidationError};
use super::state::{SubmissionOutcome, SubmissionPreview, SubmissionState, SubmitAttempt};
use super::transport::WebhookTransport;
use crate::config::WebhookConfig;
use crate::observability::SubmissionMetrics;
use crate::registration::{RegistrationInput, RegistrationPayload};
use crate::webhook::{ResolvedWebhook, WebhookResolver};

struct SessionInner {
    input: RegistrationInput,
    state: SubmissionState,
}

/// One registration form session
///
/// Owns the form fields and drives the submission state machine. At most
/// one request is in flight; triggers arriving while one is pending are
/// ignored.
pub struct RegistrationSession {
    webhook: WebhookConfig,
    transport: Arc<dyn WebhookTransport>,
    metrics: Arc<SubmissionMetrics>,
    inner: Mutex<SessionInner>,
}

impl RegistrationSession {
    pub fn new(webhook: WebhookConfig, transport: Arc<dyn WebhookTransport>) -> Self {
        Self {
            webhook,
            transport,
            metrics: Arc::new(SubmissionMetrics::new()),
            inner: Mutex::new(SessionInner {
                input: RegistrationInput::default(),
                state: SubmissionState::default(),
            }),
        }
    }

    pub fn with_input(self, input: RegistrationInput) -> Self {
        self.lock().input = input;
        self
    }

    pub fn metrics(&self) -> Arc<SubmissionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Snapshot of the current form fields
    pub fn input(&self) -> RegistrationInput {
        self.lock().input.clone()
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().state.clone()
    }

    /// Mutate form fields
    pub fn edit<R>(&self, f: impl FnOnce(&mut RegistrationInput) -> R) -> R {
        f(&mut self.lock().input)
    }

    /// Validate, resolve and build without sending or changing state
    pub fn preview(&self) -> Result<SubmissionPreview, SubmissionError> {
        let input = self.input();
        let (target, payload) = prepare(&self.webhook, &input, |_| {})?;

        Ok(SubmissionPreview {
            target,
            payload: payload.summary(),
        })
    }

    /// Run one submission attempt
    pub async fn submit(&self) -> SubmitAttempt {
        let (target, payload) = {
            let mut guard = self.lock();

            if guard.state.is_pending() {
                self.metrics.trigger_ignored();
                debug!(state = %guard.state, "Submission in flight, ignoring trigger");
                return SubmitAttempt::Ignored;
            }

            self.metrics.attempt_started();

            let SessionInner { input, state } = &mut *guard;
            let prepared = prepare(&self.webhook, input, |next| transition(state, next));

            match prepared {
                Ok(prepared) => prepared,
                Err(reason) => {
                    warn!(error = %reason, "Registration rejected before sending");
                    self.metrics.attempt_failed();
                    let outcome = SubmissionOutcome::from(reason);
                    transition(
                        &mut guard.state,
                        SubmissionState::Idle {
                            last: Some(outcome.clone()),
                        },
                    );
                    return SubmitAttempt::Finished(outcome);
                }
            }
        };

        let in_flight = InFlight::new(self);

        let summary = payload.summary();
        info!(
            url = %target.url,
            source = %target.source,
            organization = %summary.organization_name,
            agent_type = %summary.agent_type,
            urls = summary.urls.len(),
            files = ?summary.files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            "Posting registration to webhook"
        );

        let outcome = match self.transport.post(&target.url, payload).await {
            Ok(response) if response.is_success() => SubmissionOutcome::Success {
                status: response.status,
                body: response.body,
            },
            Ok(response) => SubmissionError::Server {
                status: response.status,
                body: response.body,
            }
            .into(),
            Err(err) => {
                warn!(
                    detail = err.detail(),
                    connectivity = err.is_connectivity(),
                    "Webhook request failed"
                );
                SubmissionError::Transport(err).into()
            }
        };
        in_flight.disarm();

        let mut guard = self.lock();
        match &outcome {
            SubmissionOutcome::Success { status, .. } => {
                info!(status, "Registration sent");
                self.metrics.attempt_succeeded();
                guard.input.clear();
            }
            SubmissionOutcome::Failure { reason } => {
                error!(error = %reason, "Registration failed");
                self.metrics.attempt_failed();
            }
        }
        transition(
            &mut guard.state,
            SubmissionState::Idle {
                last: Some(outcome.clone()),
            },
        );

        SubmitAttempt::Finished(outcome)
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the session to `Idle` when a send is dropped before it completes
struct InFlight<'a> {
    session: &'a RegistrationSession,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(session: &'a RegistrationSession) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!("Submission cancelled before the webhook responded");
        self.session.metrics.attempt_failed();
        let mut guard = self.session.lock();
        transition(&mut guard.state, SubmissionState::Idle { last: None });
    }
}

fn transition(state: &mut SubmissionState, next: SubmissionState) {
    debug!(from = %state, to = %next, "Submission state change");
    *state = next;
}

/// Validating -> Resolving -> Building -> Sending, reporting each step
fn prepare(
    webhook: &WebhookConfig,
    input: &RegistrationInput,
    mut on_state: impl FnMut(SubmissionState),
) -> Result<(ResolvedWebhook, RegistrationPayload), SubmissionError> {
    on_state(SubmissionState::Validating);
    if !input.passwords_match() {
        return Err(ValidationError::PasswordMismatch.into());
    }

    on_state(SubmissionState::Resolving);
    let target = WebhookResolver::new(webhook).resolve()?;

    if target.auto_completed {
        warn!(url = %target.url, "Webhook path auto-completed with the known identifier");
    }
    if target.is_plaintext() {
        warn!(url = %target.url, "Webhook uses plain http; the password is sent unencrypted");
    }

    on_state(SubmissionState::Building);
    let payload = RegistrationPayload::build(input);

    on_state(SubmissionState::Sending {
        target: target.clone(),
    });

    Ok((target, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{AgentType, Attachment, Industry, fields};
    use crate::submission::error::CONNECTIVITY_MESSAGE;
    use crate::submission::{TransportError, WebhookResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Notify, oneshot};

    /// In-memory transport returning scripted responses
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<WebhookResponse, TransportError>>>,
        received: Mutex<Vec<(String, RegistrationPayload)>>,
        calls: AtomicUsize,
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
        entered: Notify,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<WebhookResponse, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        /// Holds the first request open until `release` fires
        fn gated(
            responses: Vec<Result<WebhookResponse, TransportError>>,
        ) -> (Self, oneshot::Sender<()>) {
            let (release, gate) = oneshot::channel();
            let transport = Self::new(responses);
            *transport.gate.try_lock().unwrap() = Some(gate);
            (transport, release)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> (String, RegistrationPayload) {
            self.received.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl WebhookTransport for ScriptedTransport {
        async fn post(
            &self,
            url: &str,
            payload: RegistrationPayload,
        ) -> Result<WebhookResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.received
                .lock()
                .unwrap()
                .push((url.to_string(), payload));
            self.entered.notify_one();

            let gate = self.gate.lock().await.take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(WebhookResponse::new(200, "")))
        }
    }

    fn webhook() -> WebhookConfig {
        WebhookConfig {
            override_url: Some("https://hooks.test/webhook/abc".to_string()),
            ..WebhookConfig::default()
        }
    }

    fn valid_input() -> RegistrationInput {
        RegistrationInput {
            organization_name: "Harbor Retail".to_string(),
            industry: Some(Industry::Retail),
            email: "it@harbor.test".to_string(),
            contact: "555-0100".to_string(),
            password: "tide-pool-9".to_string(),
            confirm_password: "tide-pool-9".to_string(),
            urls: "https://harbor.test/returns\n".to_string(),
            attachments: vec![Attachment::new("returns.pdf", b"%PDF".to_vec())],
            agent_type: AgentType::Outbound,
            agreed: true,
        }
    }

    fn session_with(transport: Arc<ScriptedTransport>) -> RegistrationSession {
        RegistrationSession::new(webhook(), transport).with_input(valid_input())
    }

    #[tokio::test]
    async fn test_success_resets_fields() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(WebhookResponse::new(
            200, "ok",
        ))]));
        let session = session_with(transport.clone());

        let attempt = session.submit().await;

        let SubmitAttempt::Finished(outcome) = attempt else {
            panic!("expected a finished attempt");
        };
        assert_eq!(
            outcome,
            SubmissionOutcome::Success {
                status: 200,
                body: "ok".to_string()
            }
        );
        assert!(outcome.message().contains("200"));
        assert!(outcome.message().contains("ok"));

        let state = session.state();
        assert!(!state.is_pending());
        assert!(state.result_message().is_some());
        assert!(state.error_message().is_none());

        assert_eq!(
            session.input(),
            RegistrationInput {
                agent_type: AgentType::Outbound,
                ..Default::default()
            }
        );
        assert_eq!(transport.calls(), 1);
        assert_eq!(session.metrics().snapshot().succeeded, 1);
    }

    #[tokio::test]
    async fn test_server_error_keeps_fields() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(WebhookResponse::new(
            500, "boom",
        ))]));
        let session = session_with(transport.clone());

        let attempt = session.submit().await;

        assert_eq!(
            attempt,
            SubmitAttempt::Finished(SubmissionOutcome::Failure {
                reason: SubmissionError::Server {
                    status: 500,
                    body: "boom".to_string()
                }
            })
        );
        assert_eq!(
            session.state().error_message().as_deref(),
            Some("Webhook responded with 500: boom")
        );
        assert_eq!(session.input(), valid_input());
        assert_eq!(session.metrics().snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_password_mismatch_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::default());
        let session = session_with(transport.clone());
        session.edit(|input| input.confirm_password = "tide-pool-8".to_string());

        let attempt = session.submit().await;

        assert_eq!(
            attempt,
            SubmitAttempt::Finished(SubmissionOutcome::Failure {
                reason: SubmissionError::Validation(ValidationError::PasswordMismatch)
            })
        );
        assert_eq!(transport.calls(), 0);
        assert_eq!(
            session.state().error_message().as_deref(),
            Some("Passwords do not match")
        );
        assert_eq!(session.input().organization_name, "Harbor Retail");
    }

    #[tokio::test]
    async fn test_bad_webhook_sends_nothing() {
        let transport = Arc::new(ScriptedTransport::default());
        let config = WebhookConfig {
            override_url: Some("hooks.test/webhook/abc".to_string()),
            ..WebhookConfig::default()
        };
        let session =
            RegistrationSession::new(config, transport.clone()).with_input(valid_input());

        let SubmitAttempt::Finished(outcome) = session.submit().await else {
            panic!("expected a finished attempt");
        };

        assert!(matches!(
            outcome,
            SubmissionOutcome::Failure {
                reason: SubmissionError::Configuration(_)
            }
        ));
        assert_eq!(transport.calls(), 0);
        assert!(!session.state().is_pending());
    }

    #[tokio::test]
    async fn test_connectivity_failure_uses_diagnostic_message() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportError::classify(
            "TypeError: Failed to fetch",
        ))]));
        let session = session_with(transport.clone());

        session.submit().await;

        let message = session.state().error_message().unwrap();
        assert_eq!(message, CONNECTIVITY_MESSAGE);
        assert!(!message.contains("TypeError"));
        assert_eq!(session.input(), valid_input());
    }

    #[tokio::test]
    async fn test_generic_transport_failure_passes_message_through() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(TransportError::other(
            "error decoding response body",
        ))]));
        let session = session_with(transport);

        session.submit().await;

        assert_eq!(
            session.state().error_message().as_deref(),
            Some("error decoding response body")
        );
    }

    #[tokio::test]
    async fn test_second_trigger_while_sending_is_ignored() {
        let (transport, release) =
            ScriptedTransport::gated(vec![Ok(WebhookResponse::new(201, "created"))]);
        let transport = Arc::new(transport);
        let session = Arc::new(session_with(transport.clone()));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit().await }
        });

        transport.entered.notified().await;
        assert!(matches!(session.state(), SubmissionState::Sending { .. }));

        assert_eq!(session.submit().await, SubmitAttempt::Ignored);
        assert_eq!(session.submit().await, SubmitAttempt::Ignored);

        release.send(()).unwrap();
        let attempt = first.await.unwrap();

        assert!(matches!(
            attempt,
            SubmitAttempt::Finished(SubmissionOutcome::Success { status: 201, .. })
        ));
        assert_eq!(transport.calls(), 1);
        assert_eq!(session.metrics().snapshot().ignored, 2);
    }

    #[tokio::test]
    async fn test_resubmit_after_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(WebhookResponse::new(502, "bad gateway")),
            Ok(WebhookResponse::new(200, "")),
        ]));
        let session = session_with(transport.clone());

        session.submit().await;
        assert!(session.state().error_message().is_some());

        session.submit().await;
        assert_eq!(
            session.state().result_message().as_deref(),
            Some("Registration sent successfully. Server response: 200")
        );
        assert!(session.state().error_message().is_none());
        assert_eq!(transport.calls(), 2);
        assert_eq!(session.metrics().snapshot().attempts, 2);
    }

    #[tokio::test]
    async fn test_payload_reaches_transport() {
        let transport = Arc::new(ScriptedTransport::default());
        let session = session_with(transport.clone());

        session.submit().await;

        let (url, payload) = transport.last_request();
        assert_eq!(url, "https://hooks.test/webhook/abc");
        assert_eq!(payload.text(fields::ORGANIZATION_NAME), Some("Harbor Retail"));
        assert_eq!(payload.text(fields::INDUSTRY), Some("retail"));
        assert_eq!(payload.texts(fields::URLS), vec!["https://harbor.test/returns"]);
        assert_eq!(payload.count(fields::KNOWLEDGE_BASE_FILES), 1);
    }

    #[tokio::test]
    async fn test_auto_completed_target_is_used() {
        let transport = Arc::new(ScriptedTransport::default());
        let config = WebhookConfig {
            override_url: Some("https://tunnel.test/".to_string()),
            known_identifier: Some("abc".to_string()),
            ..WebhookConfig::default()
        };
        let session =
            RegistrationSession::new(config, transport.clone()).with_input(valid_input());

        session.submit().await;

        assert_eq!(transport.last_request().0, "https://tunnel.test/webhook/abc");
    }

    #[tokio::test]
    async fn test_cancelled_send_leaves_form_usable() {
        let (transport, _release) =
            ScriptedTransport::gated(vec![Ok(WebhookResponse::new(200, "ok"))]);
        let transport = Arc::new(transport);
        let session = session_with(transport.clone());

        tokio::select! {
            _ = session.submit() => panic!("gated submission completed"),
            _ = transport.entered.notified() => {}
        }

        assert_eq!(session.state(), SubmissionState::default());
        assert_eq!(session.input(), valid_input());

        let attempt = session.submit().await;

        assert!(matches!(
            attempt,
            SubmitAttempt::Finished(SubmissionOutcome::Success { status: 200, .. })
        ));
        assert_eq!(transport.calls(), 2);

        let metrics = session.metrics().snapshot();
        assert_eq!(metrics.attempts, 2);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.ignored, 0);
    }

    #[tokio::test]
    async fn test_timed_out_submit_can_be_retried() {
        let (transport, _release) = ScriptedTransport::gated(vec![]);
        let transport = Arc::new(transport);
        let session = session_with(transport.clone());

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), session.submit()).await;

        assert!(result.is_err());
        assert!(!session.state().is_pending());
        assert_ne!(session.submit().await, SubmitAttempt::Ignored);
    }

    #[test]
    fn test_prepare_walks_states_in_order() {
        let mut seen = Vec::new();
        prepare(&webhook(), &valid_input(), |state| seen.push(state)).unwrap();

        assert_eq!(
            seen.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["validating", "resolving", "building", "sending"]
        );
        assert!(seen.iter().all(SubmissionState::is_pending));
    }

    #[test]
    fn test_prepare_stops_at_validation() {
        let mut input = valid_input();
        input.confirm_password.clear();
        let mut seen = Vec::new();

        let result = prepare(&webhook(), &input, |state| seen.push(state));

        assert!(result.is_err());
        assert_eq!(seen, vec![SubmissionState::Validating]);
    }

    #[test]
    fn test_preview_does_not_send_or_change_state() {
        let transport = Arc::new(ScriptedTransport::default());
        let session = session_with(transport.clone());

        let preview = session.preview().unwrap();

        assert_eq!(preview.target.url, "https://hooks.test/webhook/abc");
        assert_eq!(preview.payload.organization_name, "Harbor Retail");
        assert_eq!(transport.calls(), 0);
        assert_eq!(session.state(), SubmissionState::default());
    }

    #[test]
    fn test_preview_reports_validation_error() {
        let session = session_with(Arc::new(ScriptedTransport::default()));
        session.edit(|input| input.password.clear());

        assert_eq!(
            session.preview().unwrap_err(),
            SubmissionError::Validation(ValidationError::PasswordMismatch)
        );
    }
}
