#![forbid(unsafe_code)]

//! Core domain types for helm-cel
//!
//! This module defines the document value tree that rules are evaluated
//! against and the severity attached to every rule.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Rule severity levels
///
/// Severity only decides where data failures are reported. A rule whose
/// expression does not compile is always reported as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl Severity {
    /// Returns the severity as its rules-file spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    /// True for the implicit severity, used to keep generated rules files terse
    pub fn is_default(&self) -> bool {
        *self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Severity {
    /// Anything other than exactly `warning` is treated as an error
    fn from(value: &str) -> Self {
        if value == "warning" {
            Severity::Warning
        } else {
            Severity::Error
        }
    }
}

impl From<String> for Severity {
    fn from(value: String) -> Self {
        Severity::from(value.as_str())
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_string()
    }
}

/// A numeric document value
///
/// Integers and floats are kept apart so expressions can distinguish
/// `int` from `double`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Returns the number widened to a float
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A node of the document under validation
///
/// Mappings are ordered by key so that rendering and rule generation are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    /// Creates an empty mapping
    pub fn mapping() -> Self {
        Value::Mapping(BTreeMap::new())
    }

    /// Converts a parsed YAML node into a document value
    ///
    /// Non-string mapping keys are rendered to their textual form and YAML
    /// tags are dropped.
    pub fn from_yaml(yaml: serde_yaml_ng::Value) -> Self {
        match yaml {
            serde_yaml_ng::Value::Null => Value::Null,
            serde_yaml_ng::Value::Bool(b) => Value::Bool(b),
            serde_yaml_ng::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Value::Number(Number::Float(f))
                } else {
                    Value::Null
                }
            }
            serde_yaml_ng::Value::String(s) => Value::String(s),
            serde_yaml_ng::Value::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Value::from_yaml).collect())
            }
            serde_yaml_ng::Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from_yaml(v)))
                    .collect(),
            ),
            serde_yaml_ng::Value::Tagged(tagged) => Value::from_yaml(tagged.value),
        }
    }

    /// Returns the mapping entries if this value is a mapping
    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a key when this value is a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// Deep-merges `overlay` on top of `self`
    ///
    /// Mappings merge key-wise recursively. Any other pairing is resolved in
    /// favour of the overlay, so scalars and sequences are replaced wholesale.
    pub fn merge(self, overlay: Value) -> Value {
        match (self, overlay) {
            (Value::Mapping(mut base), Value::Mapping(over)) => {
                for (key, value) in over {
                    let merged = match base.remove(&key) {
                        Some(existing) => existing.merge(value),
                        None => value,
                    };
                    base.insert(key, merged);
                }
                Value::Mapping(base)
            }
            (_, overlay) => overlay,
        }
    }
}

fn yaml_key(key: serde_yaml_ng::Value) -> String {
    match key {
        serde_yaml_ng::Value::String(s) => s,
        serde_yaml_ng::Value::Null => "null".to_string(),
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        other => Value::from_yaml(other).to_string(),
    }
}

/// Compact rendering used in reports: `70000`, `ClusterIP`, `[a b]`,
/// `map[port:80 type:ClusterIP]`, and `<nil>` for null.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Sequence(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Mapping(map) => {
                f.write_str("map[")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(x)) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Int(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::Int(i64::from(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Value {
        Value::from_yaml(serde_yaml_ng::from_str(src).unwrap())
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!(Severity::from("warning"), Severity::Warning);
        assert_eq!(Severity::from("Warning"), Severity::Error);
        assert_eq!(Severity::from("WARNING"), Severity::Error);
        assert_eq!(Severity::from(" warning"), Severity::Error);
        assert_eq!(Severity::from("error"), Severity::Error);
        assert_eq!(Severity::from(""), Severity::Error);
        assert_eq!(Severity::from("critical"), Severity::Error);
        assert_eq!(Severity::default(), Severity::Error);
    }

    #[test]
    fn test_from_yaml_shapes() {
        let value = yaml("service:\n  port: 80\n  ratio: 0.5\n  enabled: true\n  tags: [a, b]\n  name: web\n  none: ~\n");
        let service = value.get("service").unwrap();
        assert_eq!(service.get("port"), Some(&Value::from(80)));
        assert_eq!(service.get("ratio"), Some(&Value::from(0.5)));
        assert_eq!(service.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(
            service.get("tags"),
            Some(&Value::Sequence(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(service.get("name"), Some(&Value::from("web")));
        assert_eq!(service.get("none"), Some(&Value::Null));
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        let value = yaml("1: one\ntrue: yes\n");
        assert_eq!(value.get("1"), Some(&Value::from("one")));
        assert_eq!(value.get("true"), Some(&Value::from("yes")));
    }

    #[test]
    fn test_display_compact_form() {
        assert_eq!(Value::from(70000).to_string(), "70000");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from("ClusterIP").to_string(), "ClusterIP");
        assert_eq!(Value::Null.to_string(), "<nil>");
        assert_eq!(yaml("[1, two, false]").to_string(), "[1 two false]");
        assert_eq!(
            yaml("type: ClusterIP\nport: 80").to_string(),
            "map[port:80 type:ClusterIP]"
        );
        assert_eq!(yaml("a: {b: [1]}").to_string(), "map[a:map[b:[1]]]");
    }

    #[test]
    fn test_merge_is_deep_and_last_wins() {
        let base = yaml("service:\n  type: ClusterIP\n  port: 80\nlist: [1, 2]\nname: base\n");
        let overlay = yaml("service:\n  port: 8080\nlist: [3]\nextra: true\n");
        let merged = base.merge(overlay);

        let service = merged.get("service").unwrap();
        assert_eq!(service.get("type"), Some(&Value::from("ClusterIP")));
        assert_eq!(service.get("port"), Some(&Value::from(8080)));
        assert_eq!(merged.get("list"), Some(&Value::Sequence(vec![Value::from(3)])));
        assert_eq!(merged.get("name"), Some(&Value::from("base")));
        assert_eq!(merged.get("extra"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_merge_scalar_replaces_mapping() {
        let merged = yaml("a: {b: 1}").merge(yaml("a: 5"));
        assert_eq!(merged.get("a"), Some(&Value::from(5)));
    }

    #[test]
    fn test_serialize_json() {
        let value = yaml("port: 80\nname: web\nitems: [true, ~]\n");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"items":[true,null],"name":"web","port":80}"#);
    }
}
