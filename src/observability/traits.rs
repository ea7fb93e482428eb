use std::time::Duration;

/// Discrete events emitted by the chat runtime for observability.
///
/// Events carry just enough context for diagnostics. They never include the
/// credential, the preamble, or the text of user and model turns.
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    /// A session was initialized and is ready for dispatch.
    SessionStart {
        session_id: String,
        provider: String,
        model: String,
    },
    /// A request is about to be sent to an LLM provider.
    LlmRequest {
        provider: String,
        model: String,
        messages_count: usize,
    },
    /// Result of a single LLM provider call.
    LlmResponse {
        provider: String,
        model: String,
        duration: Duration,
        success: bool,
        error_message: Option<String>,
    },
    /// The session was torn down (credential cleared, reset, or exit).
    SessionEnd {
        session_id: String,
        turns: usize,
        duration: Duration,
    },
    /// An error occurred in a named component.
    Error {
        /// Subsystem where the error originated (e.g., `"initializer"`, `"dispatch"`).
        component: String,
        /// Human-readable error description. Must not contain secrets.
        message: String,
    },
}

/// Sink for [`ObserverEvent`]s.
///
/// Implementations are called inline from the chat loop and must not block.
pub trait Observer: Send + Sync + 'static {
    fn record_event(&self, event: &ObserverEvent);

    /// Push out anything buffered. Called once when the assistant shuts down.
    fn flush(&self) {}

    /// Backend name, as written in config.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Keeps the variant name of every event it sees.
    #[derive(Default)]
    struct Capture {
        kinds: Mutex<Vec<&'static str>>,
        flushed: Mutex<bool>,
    }

    impl Observer for Capture {
        fn record_event(&self, event: &ObserverEvent) {
            let kind = match event {
                ObserverEvent::SessionStart { .. } => "start",
                ObserverEvent::LlmRequest { .. } => "request",
                ObserverEvent::LlmResponse { .. } => "response",
                ObserverEvent::SessionEnd { .. } => "end",
                ObserverEvent::Error { .. } => "error",
            };
            self.kinds.lock().push(kind);
        }

        fn flush(&self) {
            *self.flushed.lock() = true;
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    #[test]
    fn events_arrive_in_order() {
        let observer = Capture::default();
        observer.record_event(&ObserverEvent::SessionStart {
            session_id: "s".into(),
            provider: "gemini".into(),
            model: "gemini-1.5-flash".into(),
        });
        observer.record_event(&ObserverEvent::Error {
            component: "dispatch".into(),
            message: "boom".into(),
        });
        observer.record_event(&ObserverEvent::SessionEnd {
            session_id: "s".into(),
            turns: 1,
            duration: Duration::from_secs(1),
        });
        assert_eq!(*observer.kinds.lock(), vec!["start", "error", "end"]);
    }

    #[test]
    fn flush_is_overridable() {
        let observer = Capture::default();
        observer.flush();
        assert!(*observer.flushed.lock());
        assert_eq!(observer.name(), "capture");
    }
}
