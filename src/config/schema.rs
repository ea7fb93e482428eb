use crate::providers;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

/// Runtime configuration.
///
/// Read from `~/.vitalis/config.toml` when present and never written back.
/// The API credential is deliberately absent: it lives in memory only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was (or would have been) loaded from - not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub reveal: RevealConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ── Provider ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "gemini" | "openai-compatible"
    #[serde(default = "default_provider_name")]
    pub name: String,
    /// Unset means the provider's own default model.
    #[serde(default)]
    pub model: Option<String>,
    /// Override the provider's API root (proxies, local gateways, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    /// Unset means the HTTP client's default (no overall timeout).
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_provider_name() -> String {
    "gemini".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            model: None,
            base_url: None,
            temperature: None,
            max_output_tokens: None,
            request_timeout_secs: None,
        }
    }
}

impl ProviderConfig {
    /// The configured model, or the default for the selected provider.
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| providers::default_model(&self.name).to_string())
    }
}

// ── Session ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Make one provider round trip while initializing so a rejected key is
    /// reported before the first message.
    #[serde(default = "default_true")]
    pub verify_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            verify_on_start: true,
        }
    }
}

// ── Reveal ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_char_delay_ms")]
    pub char_delay_ms: u64,
    /// Ctrl-C skips to the full reply instead of waiting it out.
    #[serde(default = "default_true")]
    pub interruptible: bool,
}

fn default_char_delay_ms() -> u64 {
    10
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            char_delay_ms: default_char_delay_ms(),
            interruptible: true,
        }
    }
}

// ── Observability ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// "none" | "log"
    #[serde(default = "default_observability_backend")]
    pub backend: String,
}

fn default_observability_backend() -> String {
    "log".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: default_observability_backend(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ── Loading ───────────────────────────────────────────────────────

impl Config {
    /// Default location: `~/.vitalis/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        Ok(home.join(".vitalis").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields defaults; a present
    /// but unparsable file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Config::default()
        };
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("VITALIS_PROVIDER") {
            if !provider.is_empty() {
                self.provider.name = provider;
            }
        }

        if let Ok(model) = std::env::var("VITALIS_MODEL") {
            if !model.is_empty() {
                self.provider.model = Some(model);
            }
        }

        if let Ok(url) = std::env::var("VITALIS_BASE_URL") {
            if !url.is_empty() {
                self.provider.base_url = Some(url);
            }
        }

        if let Ok(delay) = std::env::var("VITALIS_REVEAL_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                self.reveal.char_delay_ms = ms;
            }
        }
    }
}

/// Credential supplied through the environment, if any.
///
/// Checked in order: `VITALIS_API_KEY`, `GEMINI_API_KEY`. Blank values are
/// ignored so an exported-but-empty variable still triggers the prompt.
pub fn credential_from_env() -> Option<String> {
    ["VITALIS_API_KEY", "GEMINI_API_KEY"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
