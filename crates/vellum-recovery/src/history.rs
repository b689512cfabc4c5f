//! Bounded error history and aggregate statistics.

use std::collections::{HashMap, VecDeque};

use chrono::{Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use vellum_errors::ErrorContext;

/// Default cap on retained error contexts.
pub const DEFAULT_MAX_HISTORY: usize = 1000;

/// A ring buffer of [`ErrorContext`] records, oldest entries evicted first.
#[derive(Debug, Default)]
pub struct ErrorHistory {
    entries: VecDeque<ErrorContext>,
    max_entries: usize,
}

impl ErrorHistory {
    /// Construct a history bounded to `max_entries`.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_HISTORY)),
            max_entries,
        }
    }

    /// Append a context, evicting the oldest entry if the buffer is full.
    pub fn push(&mut self, context: ErrorContext) {
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(context);
    }

    /// Update the retention cap, trimming immediately if it shrank.
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// All entries, optionally filtered to a single component.
    #[must_use]
    pub fn entries(&self, component: Option<&str>) -> Vec<ErrorContext> {
        match component {
            Some(component) => self
                .entries
                .iter()
                .filter(|entry| entry.component == component)
                .cloned()
                .collect(),
            None => self.entries.iter().cloned().collect(),
        }
    }

    /// Remove entries, optionally scoped to a single component.
    pub fn clear(&mut self, component: Option<&str>) {
        match component {
            Some(component) => self.entries.retain(|entry| entry.component != component),
            None => self.entries.clear(),
        }
    }

    /// Compute aggregate statistics, optionally scoped to a single component.
    #[must_use]
    pub fn statistics(&self, component: Option<&str>) -> ErrorStatistics {
        let entries = self.entries(component);
        let one_hour_ago = Utc::now() - ChronoDuration::hours(1);

        let mut by_severity: HashMap<String, usize> = HashMap::new();
        let mut by_operation: HashMap<String, usize> = HashMap::new();
        let mut recent_errors_last_hour = 0usize;

        for entry in &entries {
            *by_severity.entry(entry.severity.to_string()).or_insert(0) += 1;
            *by_operation.entry(entry.operation.to_string()).or_insert(0) += 1;
            if entry.timestamp > one_hour_ago {
                recent_errors_last_hour += 1;
            }
        }

        ErrorStatistics {
            component: component.map_or_else(|| "All Components".to_string(), ToString::to_string),
            total_errors: entries.len(),
            by_severity,
            by_operation,
            recent_errors_last_hour,
        }
    }
}

/// Aggregate view over an [`ErrorHistory`] snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorStatistics {
    /// Component the statistics are scoped to, or `"All Components"`.
    pub component: String,
    /// Total number of retained errors in scope.
    pub total_errors: usize,
    /// Count of errors per severity label.
    pub by_severity: HashMap<String, usize>,
    /// Count of errors per operation name.
    pub by_operation: HashMap<String, usize>,
    /// Errors observed within the last hour.
    pub recent_errors_last_hour: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_errors::{ErrorContextBuilder, ErrorSeverity};

    fn context(component: &'static str, operation: &'static str) -> ErrorContext {
        ErrorContextBuilder::new(component, operation, "test_code")
            .message("boom")
            .severity(ErrorSeverity::Error)
            .build()
    }

    #[test]
    fn evicts_oldest_entry_once_full() {
        let mut history = ErrorHistory::new(2);
        history.push(context("A", "op1"));
        history.push(context("A", "op2"));
        history.push(context("A", "op3"));
        let entries = history.entries(None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, "op2");
    }

    #[test]
    fn statistics_scope_by_component() {
        let mut history = ErrorHistory::new(10);
        history.push(context("A", "op1"));
        history.push(context("B", "op2"));
        let stats = history.statistics(Some("A"));
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.component, "A");
    }
}
