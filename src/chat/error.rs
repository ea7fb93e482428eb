use crate::providers::ProviderError;
use thiserror::Error;

/// Where in the lifecycle an [`AssistantError`] belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing/invalid credential or provider settings; no session created.
    Configuration,
    /// Provider refused to open a session; re-enter the credential to retry.
    Initialization,
    /// A message exchange failed; the user turn stays unanswered.
    Dispatch,
}

/// Every failure the assistant reports back to the presentation layer.
///
/// None of these are fatal: the loop shows the message and carries on.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("{0}")]
    Configuration(String),
    #[error("could not start the session: {0}")]
    Initialization(#[source] ProviderError),
    #[error("the assistant could not answer: {0}")]
    Dispatch(#[source] ProviderError),
    #[error("no active session; enter your API key first")]
    NoSession,
}

impl AssistantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Initialization(_) => ErrorKind::Initialization,
            Self::Dispatch(_) | Self::NoSession => ErrorKind::Dispatch,
        }
    }

    /// Provider-level cause, when there is one.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Initialization(e) | Self::Dispatch(e) => Some(e),
            _ => None,
        }
    }
}
