//! Lifecycle telemetry for chat sessions.
//!
//! Events never carry the credential or message text, only ids, names,
//! counts and timings.

pub mod log;
pub mod noop;
pub mod traits;

pub use self::log::LogObserver;
pub use noop::NoopObserver;
pub use traits::{Observer, ObserverEvent};

use crate::config::ObservabilityConfig;
use std::str::FromStr;
use std::sync::Arc;

/// Observer backends selectable through `[observability] backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Log,
    None,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" | "tracing" => Ok(Self::Log),
            "none" | "noop" | "off" => Ok(Self::None),
            other => Err(format!("unknown observability backend '{other}'")),
        }
    }
}

/// Build the observer named in config. Unknown names fall back to `none`.
pub fn create_observer(config: &ObservabilityConfig) -> Arc<dyn Observer> {
    let backend = config.backend.parse().unwrap_or_else(|e: String| {
        tracing::warn!(error = %e, "Falling back to no-op observer");
        Backend::None
    });

    match backend {
        Backend::Log => Arc::new(LogObserver::new()),
        Backend::None => Arc::new(NoopObserver),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer_for(backend: &str) -> Arc<dyn Observer> {
        create_observer(&ObservabilityConfig {
            backend: backend.into(),
        })
    }

    #[test]
    fn backend_names_are_case_insensitive() {
        assert_eq!("LOG".parse::<Backend>(), Ok(Backend::Log));
        assert_eq!(" off ".parse::<Backend>(), Ok(Backend::None));
        assert!("prometheus".parse::<Backend>().is_err());
    }

    #[test]
    fn config_selects_backend() {
        assert_eq!(observer_for("log").name(), "log");
        assert_eq!(observer_for("none").name(), "noop");
    }

    #[test]
    fn unknown_backend_is_silenced() {
        assert_eq!(observer_for("statsd").name(), "noop");
    }
}
