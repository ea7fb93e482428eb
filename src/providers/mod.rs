pub mod compatible;
pub mod error;
pub mod gemini;
pub mod traits;

pub use error::ProviderError;
pub use traits::{ChatMessage, GenerationOptions, Provider, Role};

use crate::config::ProviderConfig;
use crate::session::Credential;
use compatible::OpenAiCompatibleProvider;
use gemini::GeminiProvider;
use std::sync::Arc;
use std::time::Duration;

/// Binds a credential to a provider client (`configure(credential)`).
///
/// The session layer only ever sees this seam, so tests and alternative
/// backends slot in without touching dispatch.
pub trait ProviderFactory: Send + Sync {
    fn configure(&self, credential: &Credential) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Factory driven by the `[provider]` config section.
#[derive(Debug, Clone)]
pub struct ConfiguredFactory {
    name: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl ConfiguredFactory {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            base_url: config.base_url.clone(),
            timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl ProviderFactory for ConfiguredFactory {
    fn configure(&self, credential: &Credential) -> Result<Arc<dyn Provider>, ProviderError> {
        create_provider(
            &self.name,
            credential.expose(),
            self.base_url.as_deref(),
            self.timeout,
        )
        .map(Arc::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProviderKind {
    Gemini,
    Compatible,
}

/// Accepted provider names, as written in config or on the command line.
const PROVIDER_ALIASES: &[(&str, ProviderKind)] = &[
    ("gemini", ProviderKind::Gemini),
    ("google", ProviderKind::Gemini),
    ("google-gemini", ProviderKind::Gemini),
    ("openai", ProviderKind::Compatible),
    ("openai-compatible", ProviderKind::Compatible),
    ("compatible", ProviderKind::Compatible),
];

fn resolve(name: &str) -> Option<ProviderKind> {
    PROVIDER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, kind)| *kind)
}

/// Factory: create the right provider from its config name.
pub fn create_provider(
    name: &str,
    api_key: &str,
    base_url: Option<&str>,
    timeout: Option<Duration>,
) -> Result<Box<dyn Provider>, ProviderError> {
    match resolve(name) {
        Some(ProviderKind::Gemini) => Ok(Box::new(GeminiProvider::new(api_key, base_url, timeout))),
        Some(ProviderKind::Compatible) => Ok(Box::new(OpenAiCompatibleProvider::new(
            api_key, base_url, timeout,
        ))),
        None => Err(ProviderError::UnknownProvider(name.to_string())),
    }
}

/// True when `name` resolves to a provider in [`create_provider`].
pub fn is_known_provider(name: &str) -> bool {
    resolve(name).is_some()
}

/// Model used when the config names none. Unknown names get the Gemini default.
pub fn default_model(name: &str) -> &'static str {
    match resolve(name) {
        Some(ProviderKind::Compatible) => compatible::DEFAULT_MODEL,
        Some(ProviderKind::Gemini) | None => gemini::DEFAULT_MODEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_gemini_aliases() {
        for name in ["gemini", "google", "google-gemini"] {
            let provider = create_provider(name, "k", None, None).unwrap();
            assert_eq!(provider.name(), "gemini");
        }
    }

    #[test]
    fn factory_compatible_aliases() {
        for name in ["openai", "openai-compatible", "compatible"] {
            let provider = create_provider(name, "k", Some("http://localhost:9"), None).unwrap();
            assert_eq!(provider.name(), "openai-compatible");
        }
    }

    #[test]
    fn factory_unknown_provider_errors() {
        let err = create_provider("nonexistent", "k", None, None).err().unwrap();
        assert_eq!(err, ProviderError::UnknownProvider("nonexistent".into()));
        assert!(!is_known_provider("nonexistent"));
        assert!(is_known_provider("gemini"));
    }

    #[test]
    fn every_alias_is_known_and_creatable() {
        for (alias, _) in PROVIDER_ALIASES {
            assert!(is_known_provider(alias));
            assert!(create_provider(alias, "k", Some("http://localhost:9"), None).is_ok());
        }
    }

    #[test]
    fn default_model_follows_provider() {
        assert_eq!(default_model("gemini"), gemini::DEFAULT_MODEL);
        assert_eq!(default_model("google"), gemini::DEFAULT_MODEL);
        assert_eq!(default_model("openai-compatible"), compatible::DEFAULT_MODEL);
        assert_eq!(default_model("compatible"), compatible::DEFAULT_MODEL);
    }

    #[test]
    fn configured_factory_uses_config_name() {
        let config = ProviderConfig {
            name: "openai".into(),
            ..ProviderConfig::default()
        };
        let factory = ConfiguredFactory::from_config(&config);
        let credential = Credential::new("sk-test").unwrap();
        let provider = factory.configure(&credential).unwrap();
        assert_eq!(provider.name(), "openai-compatible");
    }
}
