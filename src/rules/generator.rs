#![forbid(unsafe_code)]

//! Baseline rule generation from the shape of a values document
//!
//! The generator walks a document and emits presence, type, port-range and
//! resource-quantity rules for every key it finds. It is a starting point
//! for hand-written rules, not part of validation itself.

use crate::config::values;
use crate::error::GenerateError;
use crate::rules::{Rule, RuleSet};
use crate::types::{Number, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// Root identifier every generated path starts from
const ROOT: &str = "values";

const RESOURCE_PATTERN: &str = "^[0-9]+(.[0-9]+)?(m|Mi|Gi|Ti|Pi|Ei|n|u|m|k|M|G|T|P|E)?$";

/// Generates baseline validation rules
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleGenerator;

impl RuleGenerator {
    /// Creates a new RuleGenerator
    pub fn new() -> Self {
        RuleGenerator
    }

    /// Generates rules for every key of `document`, in key order
    pub fn generate(&self, document: &Value) -> RuleSet {
        let mut rules = RuleSet::new();
        if let Some(map) = document.as_mapping() {
            for (key, value) in map {
                self.rules_for_entry(&format!("{}.{}", ROOT, key), key, value, &mut rules);
            }
        }
        rules
    }

    /// Loads a values file and generates rules for it
    pub fn generate_from_file(&self, values_path: &Path) -> Result<RuleSet, GenerateError> {
        if !values_path.exists() {
            return Err(GenerateError::ValuesNotFound(values_path.to_path_buf()));
        }
        let document = values::load_values_file(values_path)?;
        Ok(self.generate(&document))
    }

    /// Writes `rules` as YAML to `path`
    ///
    /// Refuses to replace an existing file unless `force` is set.
    pub fn write(&self, path: &Path, rules: &RuleSet, force: bool) -> Result<(), GenerateError> {
        if !force && path.exists() {
            return Err(GenerateError::OutputExists(path.to_path_buf()));
        }
        let content = serde_yaml_ng::to_string(rules)?;
        fs::write(path, content)?;
        info!(path = %path.display(), rules = rules.len(), "wrote generated rules");
        Ok(())
    }

    fn rules_for_entry(&self, path: &str, key: &str, value: &Value, rules: &mut RuleSet) {
        match value {
            Value::Mapping(map) => {
                rules.push(Rule::new(
                    format!("has({})", path),
                    format!("{} must be defined", key),
                ));
                for (child_key, child) in map {
                    self.rules_for_entry(&format!("{}.{}", path, child_key), child_key, child, rules);
                }
            }
            Value::Sequence(items) => {
                rules.push(Rule::new(
                    format!("size({}) >= 0", path),
                    format!("{} must be an array", key),
                ));
                match items.first() {
                    Some(Value::Mapping(first)) => {
                        for (field, field_value) in first {
                            let element_path = format!("{}[0].{}", path, field);
                            self.rules_for_scalar(&element_path, field, field_value, rules);
                        }
                    }
                    Some(first) => {
                        self.rules_for_scalar(&format!("{}[0]", path), key, first, rules);
                    }
                    None => {}
                }
            }
            scalar => self.rules_for_scalar(path, key, scalar, rules),
        }
    }

    fn rules_for_scalar(&self, path: &str, key: &str, value: &Value, rules: &mut RuleSet) {
        match value {
            Value::String(_) => {
                rules.push(Rule::new(
                    format!("type({}) == string", path),
                    format!("{} must be a string", key),
                ));
                if is_resource(key) {
                    rules.push(Rule::new(
                        format!("{}.matches('{}')", path, RESOURCE_PATTERN),
                        format!("{} must be a valid resource quantity", key),
                    ));
                }
            }
            Value::Number(Number::Float(_)) => {
                rules.push(Rule::new(
                    format!("type({0}) == int || type({0}) == double", path),
                    format!("{} must be a number", key),
                ));
            }
            Value::Number(Number::Int(n)) => {
                rules.push(Rule::new(
                    format!("type({}) == int", path),
                    format!("{} must be an integer", key),
                ));
                if is_port(key, *n) {
                    rules.push(Rule::new(
                        format!("{0} >= 1 && {0} <= 65535", path),
                        format!("{} must be a valid port number (1-65535)", key),
                    ));
                }
            }
            Value::Bool(_) => {
                rules.push(Rule::new(
                    format!("type({}) == bool", path),
                    format!("{} must be a boolean", key),
                ));
            }
            Value::Null | Value::Sequence(_) | Value::Mapping(_) => {}
        }
    }
}

fn is_port(key: &str, value: i64) -> bool {
    (1..=65535).contains(&value) && key.to_lowercase().contains("port")
}

fn is_resource(key: &str) -> bool {
    let key = key.to_lowercase();
    key == "cpu" || key == "memory" || key.ends_with(".cpu") || key.ends_with(".memory")
}
