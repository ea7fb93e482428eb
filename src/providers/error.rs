use serde_json::Value;
use thiserror::Error;

/// Failure talking to an LLM provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider refused the credential (or the credential/model pair).
    #[error("credential rejected (HTTP {status}): {message}")]
    Auth { status: u16, message: String },
    /// Quota or rate limit exhausted.
    #[error("rate limited: {message}")]
    RateLimited { message: String },
    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Transport-level failure (DNS, connect, TLS, timeout, reset).
    #[error("network error: {0}")]
    Network(String),
    /// Response arrived but could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}

impl ProviderError {
    /// Build an error from a non-success HTTP status and its body.
    ///
    /// Both Gemini and OpenAI-style APIs wrap failures as
    /// `{"error": {"message": "..."}}`; the message is lifted out when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                truncate(trimmed, 300)
            }
        });

        match status {
            // Gemini answers an invalid key with 400 API_KEY_INVALID.
            400 if message.to_ascii_lowercase().contains("api key") => {
                Self::Auth { status, message }
            }
            401 | 403 => Self::Auth { status, message },
            429 => Self::RateLimited { message },
            _ => Self::Http { status, message },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")?
        .get("message")?
        .as_str()
        .map(ToString::to_string)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
