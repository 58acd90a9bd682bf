//! Error types for helm-cel
//!
//! This module defines the error types used throughout helm-cel, following
//! a hierarchical structure with specific error variants for different
//! error categories.

use std::fmt;
use std::path::PathBuf;

/// Why a parameterized reference could not be substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArityError {
    /// The body uses placeholders but the reference was written as `${name()}`
    #[error("expression requires parameters but none were provided")]
    MissingArguments,

    /// The body uses a placeholder index with no matching argument
    #[error("not enough arguments provided for parameters")]
    NotEnoughArguments,
}

/// Macro expansion errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// A reference names a macro that is not defined, or a `${` could not
    /// be parsed as a reference at all
    #[error("undefined reference in expression: {0}")]
    UndefinedReference(String),

    /// Expansion did not converge; carries the top-level expression
    #[error("circular reference detected in expression: {0}")]
    CircularReference(String),

    /// Placeholder substitution failed for the named macro
    #[error("failed to replace parameters in {name}: {reason}")]
    ParameterArity { name: String, reason: ArityError },
}

/// A rule expression that failed to parse or type-check
///
/// Renders as a one-line location header followed by the offending source
/// line and a caret under the failing column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("ERROR: <input>:{line}:{column}: {message}\n | {snippet}\n | {marker}^")]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    snippet: String,
    marker: String,
}

impl CompileError {
    /// Builds an error located at byte `offset` of `source`
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[offset..]
            .find('\n')
            .map_or(source.len(), |i| offset + i);
        let column = before[line_start..].chars().count() + 1;

        CompileError {
            message: message.into(),
            line: before.matches('\n').count() + 1,
            column,
            snippet: source[line_start..line_end].to_string(),
            marker: ".".repeat(column - 1),
        }
    }
}

/// A compiled rule that cannot be turned into a runnable program
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    /// A constant `matches` pattern is not a valid regular expression
    #[error("invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Runtime failures of a compiled expression
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A map was indexed or selected with a key it does not hold
    #[error("no such key: {0}")]
    NoSuchKey(String),

    /// A declared variable was not bound in the activation
    #[error("no such attribute: {0}")]
    NoSuchAttribute(String),

    /// An operator or function was applied to unsupported argument types
    #[error("no such overload: {0}")]
    NoSuchOverload(String),

    /// Field selection on something that is not a map
    #[error("type '{0}' does not support field selection")]
    NoFieldSelection(String),

    #[error("index out of range: index {index}, size {size}")]
    IndexOutOfRange { index: i64, size: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulus by zero")]
    ModulusByZero,

    #[error("integer overflow")]
    Overflow,

    /// A conversion or regular expression argument was rejected
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Why the text of a values file is not a usable document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// The root is a scalar or a sequence
    #[error("expected a mapping at the document root, found '{0}'")]
    NotAMapping(String),
}

/// Which kind of input file a load error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Values,
    Rules,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Values => f.write_str("values"),
            FileKind::Rules => f.write_str("rules"),
        }
    }
}

/// Errors raised while loading values or rules files
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read
    #[error("failed to load {kind} from {}: failed to read {kind} file: {source}", path.display())]
    Read {
        kind: FileKind,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was read but its content is malformed
    #[error("failed to load {kind} from {}: failed to parse {kind} file: {message}", path.display())]
    Parse {
        kind: FileKind,
        path: PathBuf,
        message: String,
    },

    /// Two rules files define the same named expression
    #[error(
        "duplicate named expression '{name}' found in {} (already defined as '{existing}')",
        path.display()
    )]
    DuplicateMacro {
        name: String,
        path: PathBuf,
        existing: String,
    },
}

impl LoadError {
    /// True when the failure is malformed content rather than a missing file
    pub fn is_parse(&self) -> bool {
        matches!(self, LoadError::Parse { .. })
    }
}

/// Configuration-related errors (helm-cel.toml)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML or has unknown fields
    #[error("Invalid configuration syntax: {0}")]
    Parse(#[from] toml::de::Error),

    /// The settings file parsed but holds unusable values
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level error for a validation run
///
/// Every variant aborts the run before an outcome is produced. Rule-level
/// compile and evaluation failures are not errors; they become findings.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// Values files could not be loaded
    #[error("failed to load values: {0}")]
    Values(#[source] LoadError),

    /// Rules files could not be loaded
    #[error("failed to load rules: {0}")]
    Rules(#[source] LoadError),

    /// A rule's macro references could not be expanded
    #[error("failed to expand rule '{rule}': {source}")]
    Expand {
        rule: String,
        #[source]
        source: ExpandError,
    },
}

/// Errors raised by the rule generator
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The values file to generate from does not exist
    #[error("values file not found: {}", .0.display())]
    ValuesNotFound(PathBuf),

    /// The output file exists and overwriting was not requested
    #[error("output file already exists: {} (use --force to overwrite)", .0.display())]
    OutputExists(PathBuf),

    /// The values file could not be loaded
    #[error("failed to generate rules: {0}")]
    Load(#[from] LoadError),

    /// The generated rules could not be serialized
    #[error("failed to marshal rules: {0}")]
    Serialize(#[from] serde_yaml_ng::Error),

    /// The rules file could not be written
    #[error("failed to write rules: {0}")]
    Io(#[from] std::io::Error),
}
