use super::traits::{Observer, ObserverEvent};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Forwards session telemetry to `tracing`.
///
/// Session boundaries log at INFO, individual requests at DEBUG, and failed
/// provider calls at WARN.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

fn millis(duration: &Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::SessionStart {
                session_id,
                provider,
                model,
            } => info!(%session_id, %provider, %model, "session.start"),
            ObserverEvent::LlmRequest {
                provider,
                model,
                messages_count,
            } => debug!(%provider, %model, messages_count, "llm.request"),
            ObserverEvent::LlmResponse {
                provider,
                model,
                duration,
                success: true,
                ..
            } => debug!(%provider, %model, duration_ms = millis(duration), "llm.response"),
            ObserverEvent::LlmResponse {
                provider,
                model,
                duration,
                error_message,
                ..
            } => warn!(
                %provider,
                %model,
                duration_ms = millis(duration),
                error = error_message.as_deref().unwrap_or("unknown"),
                "llm.response failed"
            ),
            ObserverEvent::SessionEnd {
                session_id,
                turns,
                duration,
            } => info!(%session_id, turns, duration_ms = millis(duration), "session.end"),
            ObserverEvent::Error { component, message } => {
                warn!(%component, error = %message, "chat.error");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(&Duration::from_millis(250)), 250);
        assert_eq!(millis(&Duration::from_secs(u64::MAX)), u64::MAX);
    }

    #[test]
    fn every_event_kind_is_accepted() {
        let obs = LogObserver::new();
        assert_eq!(obs.name(), "log");
        for event in [
            ObserverEvent::SessionStart {
                session_id: "abc".into(),
                provider: "gemini".into(),
                model: "gemini-1.5-flash".into(),
            },
            ObserverEvent::LlmRequest {
                provider: "gemini".into(),
                model: "gemini-1.5-flash".into(),
                messages_count: 3,
            },
            ObserverEvent::LlmResponse {
                provider: "gemini".into(),
                model: "gemini-1.5-flash".into(),
                duration: Duration::from_millis(250),
                success: false,
                error_message: Some("rate limited".into()),
            },
            ObserverEvent::SessionEnd {
                session_id: "abc".into(),
                turns: 4,
                duration: Duration::from_secs(90),
            },
        ] {
            obs.record_event(&event);
        }
    }
}
