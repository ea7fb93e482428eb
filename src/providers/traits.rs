use super::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Speaker of a single history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the history sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling knobs forwarded with every request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

/// A hosted chat model reachable with an already-configured credential.
///
/// Providers are stateless over the wire: every call carries the complete
/// history, the session layer owns what that history is.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs and observer events.
    fn name(&self) -> &str;

    /// Send the full conversation and return the model's reply text.
    async fn chat(
        &self,
        model: &str,
        history: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;

    /// Cheap round trip that proves the credential and model are accepted.
    /// Default implementation is a no-op.
    async fn warmup(&self, _model: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn chat(
            &self,
            _model: &str,
            history: &[ChatMessage],
            _options: &GenerationOptions,
        ) -> Result<String, ProviderError> {
            Ok(history
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn default_warmup_is_noop() {
        assert!(EchoProvider.warmup("any-model").await.is_ok());
    }

    #[tokio::test]
    async fn chat_receives_history() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let reply = EchoProvider
            .chat("m", &history, &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "hello");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("x")).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
        assert_eq!(Role::User.to_string(), "user");
    }
}
