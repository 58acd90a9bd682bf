#![forbid(unsafe_code)]

//! Rule and rule set definitions as they appear in `*.cel.yaml` files

use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single boolean assertion over the values document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Expression text, possibly containing `${name}` macro references
    #[serde(rename = "expr")]
    pub expression: String,

    /// Human-readable description shown when the rule fails
    #[serde(rename = "desc", default)]
    pub description: String,

    /// Where data failures of this rule are reported
    #[serde(default, skip_serializing_if = "Severity::is_default")]
    pub severity: Severity,
}

impl Rule {
    /// Creates an error-severity rule
    pub fn new(expression: impl Into<String>, description: impl Into<String>) -> Self {
        Rule {
            expression: expression.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }

    /// Returns the same rule with a different severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// An ordered list of rules plus the named expressions they may reference
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rules in declaration order
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Named expression bodies keyed by name
    #[serde(
        rename = "expressions",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub macros: BTreeMap<String, String>,
}

impl RuleSet {
    /// Creates an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, keeping declaration order
    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Defines (or redefines) a named expression
    pub fn define(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.macros.insert(name.into(), body.into());
    }

    /// Returns true if there are no rules to evaluate
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
