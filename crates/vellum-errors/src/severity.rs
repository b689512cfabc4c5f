//! Error severities shared across components.

use serde::{Deserialize, Serialize};

/// Severity level attached to an [`crate::ErrorContext`].
///
/// Ordered so the Recovery Coordinator can compare with `>=` when deciding
/// whether auto-recovery should engage for a given error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational; no action needed.
    Info,
    /// Warning; operation can continue.
    Warning,
    /// Error; operation should be retried.
    Error,
    /// Critical; user intervention required.
    Critical,
    /// Fatal; the host process is expected to exit.
    Fatal,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
            Self::Fatal => "fatal",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_are_ordered() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
        assert!(ErrorSeverity::Critical < ErrorSeverity::Fatal);
    }

    #[test]
    fn display_matches_snake_case() {
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }
}
