//! Runtime values of the expression language

use crate::types::{Number, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Runtime type of a value, also the value of the `type()` function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Double,
    String,
    List,
    Map,
    Type,
}

impl Kind {
    /// Resolves a type identifier such as `int` or `null_type`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null_type" => Some(Kind::Null),
            "bool" => Some(Kind::Bool),
            "int" => Some(Kind::Int),
            "double" => Some(Kind::Double),
            "string" => Some(Kind::String),
            "list" => Some(Kind::List),
            "map" => Some(Kind::Map),
            "type" => Some(Kind::Type),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null_type",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::List => "list",
            Kind::Map => "map",
            Kind::Type => "type",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value produced or consumed during evaluation
///
/// Lists and maps are reference counted so field selection over a large
/// document does not copy subtrees.
#[derive(Debug, Clone)]
pub enum CelValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(Arc<str>),
    List(Arc<Vec<CelValue>>),
    Map(Arc<BTreeMap<String, CelValue>>),
    Type(Kind),
}

impl CelValue {
    pub fn kind(&self) -> Kind {
        match self {
            CelValue::Null => Kind::Null,
            CelValue::Bool(_) => Kind::Bool,
            CelValue::Int(_) => Kind::Int,
            CelValue::Double(_) => Kind::Double,
            CelValue::String(_) => Kind::String,
            CelValue::List(_) => Kind::List,
            CelValue::Map(_) => Kind::Map,
            CelValue::Type(_) => Kind::Type,
        }
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        CelValue::String(s.into())
    }

    pub fn list(items: Vec<CelValue>) -> Self {
        CelValue::List(Arc::new(items))
    }

    pub fn map(entries: BTreeMap<String, CelValue>) -> Self {
        CelValue::Map(Arc::new(entries))
    }

    /// Converts a document value, preserving the int/double distinction
    pub fn from_document(value: &Value) -> Self {
        match value {
            Value::Null => CelValue::Null,
            Value::Bool(b) => CelValue::Bool(*b),
            Value::Number(Number::Int(i)) => CelValue::Int(*i),
            Value::Number(Number::Float(f)) => CelValue::Double(*f),
            Value::String(s) => CelValue::string(s.as_str()),
            Value::Sequence(items) => {
                CelValue::list(items.iter().map(CelValue::from_document).collect())
            }
            Value::Mapping(map) => CelValue::map(
                map.iter()
                    .map(|(k, v)| (k.clone(), CelValue::from_document(v)))
                    .collect(),
            ),
        }
    }

    /// Equality as the `==` operator sees it
    ///
    /// Numbers compare by value across int and double. Values of unrelated
    /// kinds are unequal.
    pub fn equals(&self, other: &CelValue) -> bool {
        match (self, other) {
            (CelValue::Null, CelValue::Null) => true,
            (CelValue::Bool(a), CelValue::Bool(b)) => a == b,
            (CelValue::String(a), CelValue::String(b)) => a == b,
            (CelValue::Type(a), CelValue::Type(b)) => a == b,
            (CelValue::List(a), CelValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (CelValue::Map(a), CelValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.equals(other)))
            }
            _ => matches!(self.compare(other), Some(Ordering::Equal)),
        }
    }

    /// Ordering for `<`, `<=`, `>`, `>=`; None when the kinds are not comparable
    pub fn compare(&self, other: &CelValue) -> Option<Ordering> {
        match (self, other) {
            (CelValue::Int(a), CelValue::Int(b)) => Some(a.cmp(b)),
            (CelValue::Int(a), CelValue::Double(b)) => (*a as f64).partial_cmp(b),
            (CelValue::Double(a), CelValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (CelValue::Double(a), CelValue::Double(b)) => a.partial_cmp(b),
            (CelValue::String(a), CelValue::String(b)) => Some(a.cmp(b)),
            (CelValue::Bool(a), CelValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl PartialEq for CelValue {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for CelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CelValue::Null => f.write_str("null"),
            CelValue::Bool(b) => write!(f, "{}", b),
            CelValue::Int(i) => write!(f, "{}", i),
            CelValue::Double(d) => write!(f, "{}", d),
            CelValue::String(s) => f.write_str(s),
            CelValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            CelValue::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            CelValue::Type(kind) => write!(f, "{}", kind),
        }
    }
}

impl From<bool> for CelValue {
    fn from(b: bool) -> Self {
        CelValue::Bool(b)
    }
}

impl From<i64> for CelValue {
    fn from(i: i64) -> Self {
        CelValue::Int(i)
    }
}

impl From<f64> for CelValue {
    fn from(d: f64) -> Self {
        CelValue::Double(d)
    }
}

impl From<&str> for CelValue {
    fn from(s: &str) -> Self {
        CelValue::string(s)
    }
}
