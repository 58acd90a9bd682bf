//! Loading and merging of `*.cel.yaml` rules files

use crate::error::{FileKind, LoadError};
use crate::rules::RuleSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parses YAML text into a rule set
///
/// An empty file holds no rules.
pub fn parse_rules(content: &str) -> Result<RuleSet, serde_yaml_ng::Error> {
    if content.trim().is_empty() {
        return Ok(RuleSet::new());
    }
    serde_yaml_ng::from_str(content)
}

/// Reads and parses a single rules file
pub fn load_rules_file(path: &Path) -> Result<RuleSet, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        kind: FileKind::Rules,
        path: path.to_path_buf(),
        source,
    })?;

    parse_rules(&content).map_err(|e| LoadError::Parse {
        kind: FileKind::Rules,
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads every rules file and merges them
///
/// Rules are concatenated in file order. Named expressions are pooled and a
/// name defined in more than one file is an error.
pub fn load_and_merge(paths: &[PathBuf]) -> Result<RuleSet, LoadError> {
    let mut merged = RuleSet::new();

    for path in paths {
        let rules = load_rules_file(path)?;
        debug!(
            path = %path.display(),
            rules = rules.rules.len(),
            expressions = rules.macros.len(),
            "merging rules file"
        );

        merged.rules.extend(rules.rules);

        for (name, body) in rules.macros {
            if let Some(existing) = merged.macros.get(&name) {
                return Err(LoadError::DuplicateMacro {
                    name,
                    path: path.clone(),
                    existing: existing.clone(),
                });
            }
            merged.macros.insert(name, body);
        }
    }

    info!(
        files = paths.len(),
        rules = merged.rules.len(),
        expressions = merged.macros.len(),
        "loaded rules"
    );
    Ok(merged)
}
