#![forbid(unsafe_code)]

//! Human-readable report formatter
//!
//! Errors are listed first, then warnings, each block introduced by a count
//! line. Findings are separated by a blank line and the report carries no
//! trailing newline.

use crate::engine::{Finding, ValidationOutcome};
use std::fmt::Write;

const ERROR_SYMBOL: &str = "❌";
const WARNING_SYMBOL: &str = "⚠️";

/// Human-readable output formatter
pub struct HumanFormatter;

impl HumanFormatter {
    /// Creates a new HumanFormatter
    pub fn new() -> Self {
        HumanFormatter
    }

    /// Renders every finding of `outcome`; empty when there are none
    pub fn format(&self, outcome: &ValidationOutcome) -> String {
        let mut output = String::new();

        if outcome.has_errors() {
            self.write_block(&mut output, "error", ERROR_SYMBOL, &outcome.errors);
        }

        if outcome.has_warnings() {
            if outcome.has_errors() {
                output.push_str("\n\n");
            }
            self.write_block(&mut output, "warning", WARNING_SYMBOL, &outcome.warnings);
        }

        output
    }

    /// Renders one finding
    pub fn format_finding(&self, symbol: &str, finding: &Finding) -> String {
        let mut output = format!("{} {}\n", symbol, finding.description);
        let _ = writeln!(output, "   Rule: {}", finding.expression);
        if let Some(path) = &finding.path {
            let _ = writeln!(output, "   Path: {}", path);
        }
        match &finding.value {
            Some(value) => {
                let _ = write!(output, "   Current value: {}", value);
            }
            None => output.push_str("   Current value: <nil>"),
        }
        output
    }

    fn write_block(&self, output: &mut String, noun: &str, symbol: &str, findings: &[Finding]) {
        let _ = write!(output, "Found {} {}(s):\n\n", findings.len(), noun);
        let rendered: Vec<String> = findings
            .iter()
            .map(|finding| self.format_finding(symbol, finding))
            .collect();
        output.push_str(&rendered.join("\n\n"));
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    fn finding(description: &str, path: Option<&str>, value: Option<Value>) -> Finding {
        Finding::new(description, "values.port <= 65535")
            .with_path(path.map(str::to_string))
            .with_value(value)
    }

    #[test]
    fn test_single_error() {
        let outcome = ValidationOutcome {
            errors: vec![finding("port too high", Some("port"), Some(Value::from(70000)))],
            warnings: vec![],
        };
        assert_eq!(
            HumanFormatter::new().format(&outcome),
            "Found 1 error(s):\n\n❌ port too high\n   Rule: values.port <= 65535\n   Path: port\n   Current value: 70000"
        );
    }

    #[test]
    fn test_errors_then_warnings() {
        let outcome = ValidationOutcome {
            errors: vec![
                finding("first", Some("port"), Some(Value::from(1))),
                finding("second", None, None),
            ],
            warnings: vec![finding("careful", Some("port"), None)],
        };
        let expected = "Found 2 error(s):\n\n\
❌ first\n   Rule: values.port <= 65535\n   Path: port\n   Current value: 1\n\n\
❌ second\n   Rule: values.port <= 65535\n   Current value: <nil>\n\n\
Found 1 warning(s):\n\n\
⚠️ careful\n   Rule: values.port <= 65535\n   Path: port\n   Current value: <nil>";
        assert_eq!(HumanFormatter::new().format(&outcome), expected);
    }

    #[test]
    fn test_warnings_only() {
        let outcome = ValidationOutcome {
            errors: vec![],
            warnings: vec![finding("careful", None, Some(Value::from("ClusterIP")))],
        };
        let output = HumanFormatter::new().format(&outcome);
        assert!(output.starts_with("Found 1 warning(s):\n\n⚠️ careful\n"));
        assert!(output.ends_with("   Current value: ClusterIP"));
    }

    #[test]
    fn test_empty_outcome() {
        assert_eq!(HumanFormatter::new().format(&ValidationOutcome::new()), "");
    }
}
