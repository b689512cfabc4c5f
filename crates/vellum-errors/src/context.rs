//! Immutable error context records appended to the Recovery Coordinator's history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::severity::ErrorSeverity;

/// A single failure observation, created once at the failure site and never
/// mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Component that raised the error (used to key breakers/strategies).
    pub component: &'static str,
    /// Operation name within the component.
    pub operation: &'static str,
    /// Human-readable failure description.
    pub message: String,
    /// Stable machine-readable error code.
    pub code: &'static str,
    /// Severity of the failure.
    pub severity: ErrorSeverity,
    /// Time the error was observed.
    pub timestamp: DateTime<Utc>,
    /// Optional captured stack/context frames (free-form strings).
    pub stack: Vec<String>,
    /// Arbitrary structured metadata attached at the failure site.
    pub metadata: Map<String, Value>,
}

/// Fluent builder for [`ErrorContext`], mirroring the rest of this workspace's
/// preference for explicit constructors over ad-hoc struct literals.
#[derive(Debug, Clone)]
pub struct ErrorContextBuilder {
    component: &'static str,
    operation: &'static str,
    code: &'static str,
    message: String,
    severity: ErrorSeverity,
    stack: Vec<String>,
    metadata: Map<String, Value>,
}

impl ErrorContextBuilder {
    /// Start building a new context for the given component/operation/code.
    #[must_use]
    pub fn new(component: &'static str, operation: &'static str, code: &'static str) -> Self {
        Self {
            component,
            operation,
            code,
            message: String::new(),
            severity: ErrorSeverity::Error,
            stack: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Set the human-readable message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the severity (default [`ErrorSeverity::Error`]).
    #[must_use]
    pub const fn severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach a captured stack frame.
    #[must_use]
    pub fn stack_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }

    /// Attach a metadata key/value pair.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Finalize the context, stamping the current time.
    #[must_use]
    pub fn build(self) -> ErrorContext {
        ErrorContext {
            component: self.component,
            operation: self.operation,
            message: self.message,
            code: self.code,
            severity: self.severity,
            timestamp: Utc::now(),
            stack: self.stack,
            metadata: self.metadata,
        }
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}::{} - {} ({})",
            self.severity, self.component, self.operation, self.message, self.code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_expected_context() {
        let ctx = ErrorContextBuilder::new("Downloader", "fetch", "network_error")
            .message("connection reset")
            .severity(ErrorSeverity::Warning)
            .metadata("url", Value::String("https://example.test".into()))
            .build();

        assert_eq!(ctx.component, "Downloader");
        assert_eq!(ctx.operation, "fetch");
        assert_eq!(ctx.severity, ErrorSeverity::Warning);
        assert_eq!(ctx.metadata.get("url").and_then(Value::as_str), Some("https://example.test"));
    }

    #[test]
    fn display_matches_spec_format() {
        let ctx = ErrorContextBuilder::new("X", "op", "code")
            .message("boom")
            .severity(ErrorSeverity::Critical)
            .build();
        assert_eq!(ctx.to_string(), "[critical] X::op - boom (code)");
    }
}
