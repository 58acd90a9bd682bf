#![forbid(unsafe_code)]

//! JSON and YAML report formatter

use crate::engine::ValidationOutcome;
use serde::Serialize;

/// Top-level document of a structured report
#[derive(Debug, Serialize)]
pub struct ValidationReport<'a> {
    pub has_errors: bool,
    pub has_warnings: bool,
    pub result: &'a ValidationOutcome,
}

impl<'a> ValidationReport<'a> {
    pub fn new(outcome: &'a ValidationOutcome) -> Self {
        ValidationReport {
            has_errors: outcome.has_errors(),
            has_warnings: outcome.has_warnings(),
            result: outcome,
        }
    }
}

/// Machine-readable output formatter
pub struct StructuredFormatter;

impl StructuredFormatter {
    /// Creates a new StructuredFormatter
    pub fn new() -> Self {
        StructuredFormatter
    }

    /// Pretty-printed JSON with two-space indentation
    pub fn json(&self, outcome: &ValidationOutcome) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&ValidationReport::new(outcome))
    }

    pub fn yaml(&self, outcome: &ValidationOutcome) -> Result<String, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(&ValidationReport::new(outcome))
    }
}

impl Default for StructuredFormatter {
    fn default() -> Self {
        Self::new()
    }
}
