//! Google Gemini provider (Generative Language API, API-key auth).
//!
//! The key travels in the `x-goog-api-key` header rather than the query
//! string so it never shows up in URLs that end up in logs or error text.

use super::error::ProviderError;
use super::traits::{ChatMessage, GenerationOptions, Provider, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini provider bound to one API key.
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    client: Client,
}

// ── API request/response types ──────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiProvider {
    pub fn new(api_key: &str, base_url: Option<&str>, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: builder.build().unwrap_or_else(|_| Client::new()),
        }
    }

    fn model_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}", self.base_url)
    }

    fn wire_role(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    fn build_request<'a>(
        history: &'a [ChatMessage],
        options: &GenerationOptions,
    ) -> GenerateContentRequest<'a> {
        let contents = history
            .iter()
            .map(|m| Content {
                role: Self::wire_role(m.role),
                parts: vec![Part { text: &m.content }],
            })
            .collect();

        let generation_config =
            if options.temperature.is_none() && options.max_output_tokens.is_none() {
                None
            } else {
                Some(GenerationConfig {
                    temperature: options.temperature,
                    max_output_tokens: options.max_output_tokens,
                })
            };

        GenerateContentRequest {
            contents,
            generation_config,
        }
    }

    fn extract_text(response: GenerateContentResponse) -> Result<String, ProviderError> {
        if let Some(err) = response.error {
            return Err(ProviderError::Malformed(err.message));
        }

        let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "response carried no candidates".to_string());
            return Err(ProviderError::Malformed(reason));
        };

        // A candidate without text (e.g. finishReason SAFETY) is rendered as-is.
        Ok(candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn chat(
        &self,
        model: &str,
        history: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request = Self::build_request(history, options);
        let url = format!("{}:generateContent", self.model_url(model));

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), &body));
        }

        let body: GenerateContentResponse = response.json().await?;
        Self::extract_text(body)
    }

    async fn warmup(&self, model: &str) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(self.model_url(model))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(model, "Gemini model metadata fetched");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProviderError::from_status(status.as_u16(), &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<String, ProviderError> {
        GeminiProvider::extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn model_url_accepts_prefixed_names() {
        let p = GeminiProvider::new("k", Some("http://localhost:1/v1beta/"), None);
        assert_eq!(
            p.model_url("gemini-1.5-flash"),
            "http://localhost:1/v1beta/models/gemini-1.5-flash"
        );
        assert_eq!(
            p.model_url("models/gemini-1.5-pro"),
            "http://localhost:1/v1beta/models/gemini-1.5-pro"
        );
    }

    #[test]
    fn request_maps_assistant_to_model_role() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        let request = GeminiProvider::build_request(&history, &GenerationOptions::default());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "hello");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn request_includes_generation_config_when_set() {
        let history = vec![ChatMessage::user("hi")];
        let options = GenerationOptions {
            temperature: Some(0.4),
            max_output_tokens: None,
        };
        let json = serde_json::to_value(GeminiProvider::build_request(&history, &options)).unwrap();
        assert_eq!(json["generationConfig"]["temperature"], 0.4);
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn response_text_parts_are_joined() {
        let text = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(text, "Hello there");
    }

    #[test]
    fn candidate_without_content_yields_empty_text() {
        let text = parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn missing_candidates_is_malformed() {
        let err = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert_eq!(
            err,
            ProviderError::Malformed("prompt blocked: SAFETY".into())
        );

        let err = parse("{}").unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn inline_error_is_surfaced() {
        let err = parse(r#"{"error":{"message":"Invalid API key"}}"#).unwrap_err();
        assert_eq!(err, ProviderError::Malformed("Invalid API key".into()));
    }
}
