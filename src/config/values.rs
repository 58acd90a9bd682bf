//! Loading and merging of values documents

use crate::error::{DocumentError, FileKind, LoadError};
use crate::types::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parses YAML text into a values document
///
/// An empty document is an empty mapping. Any other non-mapping root is
/// rejected.
pub fn parse_document(content: &str) -> Result<Value, DocumentError> {
    if content.trim().is_empty() {
        return Ok(Value::mapping());
    }

    let yaml: serde_yaml_ng::Value = serde_yaml_ng::from_str(content)?;
    match Value::from_yaml(yaml) {
        Value::Null => Ok(Value::mapping()),
        mapping @ Value::Mapping(_) => Ok(mapping),
        other => Err(DocumentError::NotAMapping(other.to_string())),
    }
}

/// Reads and parses a single values file
pub fn load_values_file(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        kind: FileKind::Values,
        path: path.to_path_buf(),
        source,
    })?;

    parse_document(&content).map_err(|e| LoadError::Parse {
        kind: FileKind::Values,
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads every values file and deep-merges them in order
///
/// Later files override earlier ones: mappings merge key by key, anything
/// else is replaced.
pub fn load_and_merge(paths: &[PathBuf]) -> Result<Value, LoadError> {
    let mut merged = Value::mapping();
    for path in paths {
        let document = load_values_file(path)?;
        debug!(path = %path.display(), "merging values file");
        merged = merged.merge(document);
    }
    info!(files = paths.len(), "loaded values");
    Ok(merged)
}
