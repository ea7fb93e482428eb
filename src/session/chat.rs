//! Model handle and live chat session over a [`Provider`].
//!
//! Mirrors the provider-SDK shape the assistant depends on:
//! `configure(credential)` → [`ProviderFactory::configure`],
//! `createModel(name)` → [`ModelHandle::new`],
//! `model.startSession(history)` → [`ModelHandle::start_session`],
//! `session.send(text)` → [`ChatSession::send`].

use super::credential::Credential;
use super::preamble;
use crate::providers::{
    gemini, ChatMessage, GenerationOptions, Provider, ProviderError, ProviderFactory,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Settings for [`initialize`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub model: String,
    pub generation: GenerationOptions,
    /// Probe the provider once before handing the session out.
    pub verify_on_start: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: gemini::DEFAULT_MODEL.into(),
            generation: GenerationOptions::default(),
            verify_on_start: true,
        }
    }
}

/// A provider plus the model name requests are addressed to.
#[derive(Clone)]
pub struct ModelHandle {
    provider: Arc<dyn Provider>,
    model: String,
    generation: GenerationOptions,
}

impl ModelHandle {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            generation: GenerationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_generation(mut self, generation: GenerationOptions) -> Self {
        self.generation = generation;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn warmup(&self) -> Result<(), ProviderError> {
        self.provider.warmup(&self.model).await
    }

    /// Open a session whose hidden history starts as `history`.
    pub fn start_session(&self, history: Vec<ChatMessage>) -> ChatSession {
        ChatSession {
            id: Uuid::new_v4().to_string(),
            handle: self.clone(),
            seed_len: history.len(),
            history,
            started: Instant::now(),
        }
    }
}

/// Live conversational context: one model, one growing hidden history.
pub struct ChatSession {
    id: String,
    handle: ModelHandle,
    history: Vec<ChatMessage>,
    seed_len: usize,
    started: Instant,
}

impl ChatSession {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn model(&self) -> &str {
        &self.handle.model
    }

    pub fn provider_name(&self) -> &str {
        self.handle.provider.name()
    }

    /// Full hidden history, seed turns included.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Number of exchanged (non-seed) history entries.
    pub fn exchanged(&self) -> usize {
        self.history.len() - self.seed_len
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Send one user turn and return the model's full reply.
    ///
    /// On failure the user turn is removed again, so the provider never sees
    /// two user turns in a row on the next attempt.
    pub async fn send(&mut self, text: &str) -> Result<String, ProviderError> {
        self.history.push(ChatMessage::user(text));

        let result = self
            .handle
            .provider
            .chat(&self.handle.model, &self.history, &self.handle.generation)
            .await;

        match result {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}

/// Build a ready-to-use session for `credential`.
///
/// Nothing is retained on failure: the provider client and handle are local
/// until the session is returned.
pub async fn initialize(
    factory: &dyn ProviderFactory,
    credential: &Credential,
    options: &SessionOptions,
) -> Result<ChatSession, ProviderError> {
    let provider = factory.configure(credential)?;
    let handle = ModelHandle::new(provider, options.model.clone()).with_generation(options.generation);

    if options.verify_on_start {
        handle.warmup().await?;
    }

    let session = handle.start_session(preamble::seed_history());
    tracing::debug!(
        session_id = %session.id(),
        provider = session.provider_name(),
        model = session.model(),
        "Chat session initialized"
    );
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        seen: Mutex<Vec<usize>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            _model: &str,
            history: &[ChatMessage],
            _options: &GenerationOptions,
        ) -> Result<String, ProviderError> {
            self.seen.lock().push(history.len());
            self.replies.lock().remove(0)
        }
    }

    #[tokio::test]
    async fn send_appends_user_and_reply() {
        let provider = ScriptedProvider::new(vec![Ok("reply".into())]);
        let mut session =
            ModelHandle::new(provider.clone(), "m").start_session(preamble::seed_history());

        let reply = session.send("hello").await.unwrap();
        assert_eq!(reply, "reply");
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.exchanged(), 2);
        assert_eq!(session.history()[2], ChatMessage::user("hello"));
        assert_eq!(session.history()[3], ChatMessage::assistant("reply"));
        // provider saw seed + user turn
        assert_eq!(*provider.seen.lock(), vec![3]);
    }

    #[tokio::test]
    async fn failed_send_rolls_back_history() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Network("reset".into())),
            Ok("second".into()),
        ]);
        let mut session =
            ModelHandle::new(provider.clone(), "m").start_session(preamble::seed_history());

        assert!(session.send("first").await.is_err());
        assert_eq!(session.history().len(), 2);

        session.send("retry").await.unwrap();
        assert_eq!(session.history()[2], ChatMessage::user("retry"));
        assert_eq!(*provider.seen.lock(), vec![3, 3]);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let provider = ScriptedProvider::new(Vec::new());
        let handle = ModelHandle::new(provider, "m");
        let a = handle.start_session(Vec::new());
        let b = handle.start_session(Vec::new());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.model(), "m");
        assert_eq!(a.provider_name(), "scripted");
    }
}
