#![forbid(unsafe_code)]

//! helm-cel: validate Helm chart values with CEL expressions
//!
//! Rules pair a CEL expression over the `values` document with a
//! description and a severity. Rules files may also declare named
//! expressions, referenced from rules as `${name}` or `${name(arg, ...)}`
//! and expanded before compilation.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod expr;
pub mod output;
pub mod rules;
pub mod types;

// Re-export error types for convenient access
pub use error::{
    ConfigError, DocumentError, EvalError, ExpandError, GenerateError, LoadError, ValidateError,
};

// Re-export core domain types for convenient access
pub use engine::{Finding, ValidationOutcome, Validator};
pub use rules::{MacroExpander, Rule, RuleSet};
pub use types::{Severity, Value};
