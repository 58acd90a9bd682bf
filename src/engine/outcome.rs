//! Findings and the per-run validation outcome

use crate::types::{Severity, Value};
use serde::Serialize;

/// A single failed rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Rule description, or a compile diagnostic naming the rule
    pub description: String,
    /// The fully expanded expression that was evaluated
    pub expression: String,
    /// Value found at `path` in the document, if any
    pub value: Option<Value>,
    /// Dotted path into the document the failure was attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Finding {
    pub fn new(description: impl Into<String>, expression: impl Into<String>) -> Self {
        Finding {
            description: description.into(),
            expression: expression.into(),
            value: None,
            path: None,
        }
    }

    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_value(mut self, value: Option<Value>) -> Self {
        self.value = value;
        self
    }
}

/// Errors and warnings of one validation run, in rule declaration order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `finding` under errors or warnings according to `severity`
    pub fn record(&mut self, severity: Severity, finding: Finding) {
        match severity {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// True when no rule produced an error; warnings do not count
    pub fn is_success(&self) -> bool {
        !self.has_errors()
    }
}
