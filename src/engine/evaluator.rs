#![forbid(unsafe_code)]

//! Per-rule compilation, evaluation and classification

use crate::engine::diagnostics::{extract_path_and_value, extract_path_from_error};
use crate::engine::outcome::Finding;
use crate::engine::verdict::RuleVerdict;
use crate::expr::{Activation, CelValue, Environment};
use crate::rules::Rule;
use crate::types::{Severity, Value};
use tracing::debug;

/// Name under which the document is visible to expressions
pub const ROOT_VARIABLE: &str = "values";

/// Runs expanded rules against one document
///
/// The environment and activation are built once and shared by every rule
/// evaluated through this instance.
pub struct RuleEvaluator<'a> {
    env: Environment,
    activation: Activation,
    document: &'a Value,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(document: &'a Value) -> Self {
        RuleEvaluator {
            env: Environment::new().with_variable(ROOT_VARIABLE),
            activation: Activation::new().bind_document(ROOT_VARIABLE, document),
            document,
        }
    }

    /// Compiles and evaluates one expanded expression
    pub fn evaluate(&self, expression: &str) -> RuleVerdict {
        let ast = match self.env.compile(expression) {
            Ok(ast) => ast,
            Err(e) => return RuleVerdict::CompileFailed(e),
        };
        let program = match self.env.program(&ast) {
            Ok(program) => program,
            Err(e) => return RuleVerdict::ProgramFailed(e),
        };
        match program.evaluate(&self.activation) {
            Ok(CelValue::Bool(true)) => RuleVerdict::Passed,
            Ok(other) => RuleVerdict::Failed(other),
            Err(e) => RuleVerdict::EvalFailed(e),
        }
    }

    /// Evaluates `rule`, whose expression has already been expanded to
    /// `expression`, and turns a failure into a finding
    ///
    /// Compile and program failures are always errors. Runtime errors and
    /// false results use the rule's declared severity.
    pub fn check(&self, rule: &Rule, expression: String) -> Option<(Severity, Finding)> {
        let verdict = self.evaluate(&expression);
        debug!(rule = %rule.description, verdict = verdict.label(), "evaluated rule");

        match verdict {
            RuleVerdict::Passed => None,
            RuleVerdict::CompileFailed(e) => Some((
                Severity::Error,
                Finding::new(
                    format!("Invalid rule syntax in '{}': {}", rule.description, e),
                    expression,
                ),
            )),
            RuleVerdict::ProgramFailed(e) => Some((
                Severity::Error,
                Finding::new(
                    format!("Failed to process rule '{}': {}", rule.description, e),
                    expression,
                ),
            )),
            RuleVerdict::EvalFailed(e) => {
                let path = extract_path_from_error(&e.to_string());
                Some((
                    rule.severity,
                    Finding::new(rule.description.clone(), expression).with_path(path),
                ))
            }
            RuleVerdict::Failed(_) => {
                let (value, path) = extract_path_and_value(self.document, &expression);
                Some((
                    rule.severity,
                    Finding::new(rule.description.clone(), expression)
                        .with_value(value)
                        .with_path(path),
                ))
            }
        }
    }
}
