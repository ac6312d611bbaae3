// ─────────────────────────────────────────────────────────────────────
// ToneSoul — Honesty Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all honesty kernel failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Rule source missing, unreadable or malformed.
    #[error("rule load error: {0}")]
    RuleLoad(String),

    /// Embedding provider unreachable, timed out or returned unusable vectors.
    #[error("embedding failure: {0}")]
    Embedding(String),

    /// Tone analyzer unreachable or failed to produce a reading.
    #[error("tone analysis failure: {0}")]
    Analysis(String),

    /// Reflection generator returned an error.
    #[error("reflection generation failed: {0}")]
    Reflection(String),

    /// Reflection generator did not answer within the deadline.
    #[error("reflection generation exceeded {timeout_ms}ms deadline")]
    ReflectionTimeout { timeout_ms: u64 },

    /// Upstream contract breach, e.g. a tone dimension outside [0, 1].
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Persona lookup failed.
    #[error("unknown persona: {0}")]
    UnknownPersona(String),
}

impl KernelError {
    /// Whether the caller can continue the turn with degraded output.
    ///
    /// Only reflection failures qualify: the numeric feedback never
    /// depends on the reflection text.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KernelError::Reflection(_) | KernelError::ReflectionTimeout { .. }
        )
    }
}

pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = KernelError::ReflectionTimeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "reflection generation exceeded 250ms deadline");
    }

    #[test]
    fn test_only_reflection_failures_recoverable() {
        assert!(KernelError::Reflection("down".into()).is_recoverable());
        assert!(KernelError::ReflectionTimeout { timeout_ms: 1 }.is_recoverable());
        assert!(!KernelError::Embedding("down".into()).is_recoverable());
        assert!(!KernelError::Invariant("bad".into()).is_recoverable());
        assert!(!KernelError::Analysis("down".into()).is_recoverable());
    }
}
