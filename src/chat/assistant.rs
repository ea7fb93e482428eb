use super::error::AssistantError;
use crate::observability::{Observer, ObserverEvent};
use crate::providers::{ProviderError, ProviderFactory};
use crate::session::{self, ChatSession, Credential, SessionOptions, Transcript};
use std::sync::Arc;
use std::time::Instant;

/// Guidance shown whenever a credential is missing or blank.
pub const CREDENTIAL_GUIDANCE: &str = "Please enter your API key to start the chat. \
Get a Google AI key at https://aistudio.google.com/app/apikey";

/// Result of [`Assistant::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input: nothing dispatched, nothing recorded.
    Ignored,
    /// The model's full reply, already appended to the transcript.
    Replied(String),
}

/// Owns the credential, the active session, and the visible transcript.
///
/// At most one session exists at a time. Replacing or clearing the
/// credential tears the session down and empties the transcript.
pub struct Assistant {
    factory: Arc<dyn ProviderFactory>,
    options: SessionOptions,
    observer: Arc<dyn Observer>,
    credential: Option<Credential>,
    session: Option<ChatSession>,
    transcript: Transcript,
}

impl Assistant {
    pub fn new(
        factory: Arc<dyn ProviderFactory>,
        options: SessionOptions,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            factory,
            options,
            observer,
            credential: None,
            session: None,
            transcript: Transcript::new(),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Accept a freshly entered credential and open a session with it.
    ///
    /// Blank input is a configuration error. On any failure the assistant is
    /// left with no credential and no session.
    pub async fn connect(&mut self, raw_credential: &str) -> Result<(), AssistantError> {
        self.clear_credential();

        let Some(credential) = Credential::new(raw_credential) else {
            return Err(AssistantError::Configuration(CREDENTIAL_GUIDANCE.into()));
        };
        self.credential = Some(credential);

        let result = self.initialize().await;
        if result.is_err() {
            self.credential = None;
        }
        result
    }

    /// (Re)open a session with the held credential and start an empty transcript.
    pub async fn initialize(&mut self) -> Result<(), AssistantError> {
        self.end_session();

        let Some(credential) = self.credential.as_ref() else {
            return Err(AssistantError::Configuration(CREDENTIAL_GUIDANCE.into()));
        };

        match session::initialize(self.factory.as_ref(), credential, &self.options).await {
            Ok(session) => {
                self.observer.record_event(&ObserverEvent::SessionStart {
                    session_id: session.id().to_string(),
                    provider: session.provider_name().to_string(),
                    model: session.model().to_string(),
                });
                self.session = Some(session);
                Ok(())
            }
            Err(e) => {
                self.observer.record_event(&ObserverEvent::Error {
                    component: "initializer".into(),
                    message: e.to_string(),
                });
                Err(match e {
                    ProviderError::UnknownProvider(name) => AssistantError::Configuration(
                        format!("Unknown provider '{name}'. Use \"gemini\" or \"openai-compatible\"."),
                    ),
                    other => AssistantError::Initialization(other),
                })
            }
        }
    }

    /// Forget the credential; destroys the session along with it.
    pub fn clear_credential(&mut self) {
        self.end_session();
        self.credential = None;
    }

    /// Tear down the active session, if any, and empty the transcript.
    pub fn end_session(&mut self) {
        if let Some(session) = self.session.take() {
            self.observer.record_event(&ObserverEvent::SessionEnd {
                session_id: session.id().to_string(),
                turns: self.transcript.len(),
                duration: session.started().elapsed(),
            });
        }
        self.transcript.clear();
    }

    /// Dispatch one user message.
    ///
    /// Blank input is ignored without touching the provider. Anything else is
    /// recorded and sent as typed. The user turn is recorded before the
    /// request goes out; on failure it stays unanswered.
    pub async fn submit(&mut self, text: &str) -> Result<Submission, AssistantError> {
        if text.trim().is_empty() {
            return Ok(Submission::Ignored);
        }

        let Some(session) = self.session.as_mut() else {
            return Err(AssistantError::NoSession);
        };

        self.transcript.push_user(text);

        let provider = session.provider_name().to_string();
        let model = session.model().to_string();
        self.observer.record_event(&ObserverEvent::LlmRequest {
            provider: provider.clone(),
            model: model.clone(),
            messages_count: session.history().len() + 1,
        });

        let started = Instant::now();
        let result = session.send(text).await;

        self.observer.record_event(&ObserverEvent::LlmResponse {
            provider,
            model,
            duration: started.elapsed(),
            success: result.is_ok(),
            error_message: result.as_ref().err().map(ToString::to_string),
        });

        match result {
            Ok(reply) => {
                self.transcript.push_assistant(reply.clone());
                Ok(Submission::Replied(reply))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dispatch failed");
                self.observer.record_event(&ObserverEvent::Error {
                    component: "dispatch".into(),
                    message: e.to_string(),
                });
                Err(AssistantError::Dispatch(e))
            }
        }
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        self.end_session();
        self.observer.flush();
    }
}
