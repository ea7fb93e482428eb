use std::fmt;

/// User-supplied API key, held in memory for the lifetime of a session.
///
/// The only validation is non-emptiness after trimming. `Debug` is redacted
/// so the key cannot leak through `tracing` fields or error chains.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw secret, for handing to the provider client only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_is_rejected() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   \n\t").is_none());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let c = Credential::new("  AIza-test \n").unwrap();
        assert_eq!(c.expose(), "AIza-test");
    }

    #[test]
    fn debug_is_redacted() {
        let c = Credential::new("super-secret").unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert_eq!(dbg, "Credential(***)");
    }
}
