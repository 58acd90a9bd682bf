#![forbid(unsafe_code)]

//! Validation runs over a whole rule set
//!
//! Every rule is expanded before any rule is evaluated, so an expansion
//! failure aborts the run without a partial outcome.

use crate::config::{rules_file, values};
use crate::engine::evaluator::RuleEvaluator;
use crate::engine::outcome::ValidationOutcome;
use crate::error::ValidateError;
use crate::rules::{MacroExpander, Rule, RuleSet};
use crate::types::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Validates documents against rule sets
#[derive(Debug, Default, Clone, Copy)]
pub struct Validator;

impl Validator {
    /// Creates a new Validator
    pub fn new() -> Self {
        Validator
    }

    /// Expands and evaluates every rule of `rules` against `document`
    pub fn validate(
        &self,
        document: &Value,
        rules: &RuleSet,
    ) -> Result<ValidationOutcome, ValidateError> {
        if rules.is_empty() {
            info!("no rules to evaluate");
            return Ok(ValidationOutcome::new());
        }

        let expander = MacroExpander::new(&rules.macros);
        let expanded: Vec<(&Rule, String)> = rules
            .rules
            .iter()
            .map(|rule| {
                expander
                    .expand(&rule.expression)
                    .map(|expression| (rule, expression))
                    .map_err(|source| ValidateError::Expand {
                        rule: rule.description.clone(),
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;
        debug!(rules = expanded.len(), "expanded rules");

        let evaluator = RuleEvaluator::new(document);
        let mut outcome = ValidationOutcome::new();
        for (rule, expression) in expanded {
            if let Some((severity, finding)) = evaluator.check(rule, expression) {
                outcome.record(severity, finding);
            }
        }

        info!(
            rules = rules.len(),
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            "validation finished"
        );
        Ok(outcome)
    }

    /// Loads values and rules files relative to `chart_dir` and validates
    ///
    /// Values files are deep-merged in order and rules files concatenated.
    /// Absolute paths are used as given.
    pub fn validate_chart(
        &self,
        chart_dir: &Path,
        values_files: &[PathBuf],
        rules_files: &[PathBuf],
    ) -> Result<ValidationOutcome, ValidateError> {
        let document = values::load_and_merge(&resolve_paths(chart_dir, values_files))
            .map_err(ValidateError::Values)?;
        let rules = rules_file::load_and_merge(&resolve_paths(chart_dir, rules_files))
            .map_err(ValidateError::Rules)?;
        self.validate(&document, &rules)
    }
}

/// Joins each file onto `base`; absolute files replace the base
pub fn resolve_paths(base: &Path, files: &[PathBuf]) -> Vec<PathBuf> {
    files.iter().map(|file| base.join(file)).collect()
}
