#![forbid(unsafe_code)]

//! Rule expression language
//!
//! A subset of CEL: literals, lists and maps, field selection, indexing,
//! arithmetic, comparisons, `&&`/`||`/`?:`, `has()`, the comprehension
//! macros and a small builtin library. Compilation happens in three steps:
//!
//! 1. [`Environment::compile`] parses and checks source text into an [`Ast`]
//! 2. [`Environment::program`] turns the ast into a runnable [`Program`]
//! 3. [`Program::evaluate`] runs it against an [`Activation`]
//!
//! An environment is built once per validation run and reused for every
//! rule.

mod ast;
mod checker;
mod eval;
mod parser;
mod value;

pub use value::{CelValue, Kind};

use crate::error::{CompileError, EvalError, ProgramError};
use crate::types::Value;
use ast::Expr;
use checker::Checker;
use eval::Interpreter;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

/// Declared variables available to compiled expressions
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: BTreeSet<String>,
}

impl Environment {
    /// Creates an environment with no variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable that expressions may reference
    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variables.insert(name.into());
        self
    }

    /// Parses and checks `source`
    pub fn compile(&self, source: &str) -> Result<Ast, CompileError> {
        let parsed = parser::parse(source)?;
        let expr = Checker::new(source, &self.variables).check(parsed)?;
        Ok(Ast { expr })
    }

    /// Prepares a checked expression for evaluation
    ///
    /// Constant `matches` patterns are compiled here so an invalid pattern
    /// is reported once, before evaluation.
    pub fn program(&self, ast: &Ast) -> Result<Program, ProgramError> {
        let mut patterns = HashMap::new();
        collect_patterns(&ast.expr, &mut patterns)?;
        Ok(Program {
            expr: ast.expr.clone(),
            patterns,
        })
    }
}

/// A parsed and checked expression
#[derive(Debug, Clone)]
pub struct Ast {
    expr: Expr,
}

/// A runnable expression
#[derive(Debug, Clone)]
pub struct Program {
    expr: Expr,
    patterns: HashMap<String, Regex>,
}

impl Program {
    /// Evaluates the expression against `activation`
    pub fn evaluate(&self, activation: &Activation) -> Result<CelValue, EvalError> {
        Interpreter::new(activation, &self.patterns).run(&self.expr)
    }
}

/// Variable bindings for one evaluation
#[derive(Debug, Clone, Default)]
pub struct Activation {
    bindings: HashMap<String, CelValue>,
}

impl Activation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any previous binding
    pub fn bind(mut self, name: impl Into<String>, value: CelValue) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    /// Binds `name` to a document value
    pub fn bind_document(self, name: impl Into<String>, document: &Value) -> Self {
        self.bind(name, CelValue::from_document(document))
    }

    pub fn get(&self, name: &str) -> Option<&CelValue> {
        self.bindings.get(name)
    }
}

fn collect_patterns(expr: &Expr, patterns: &mut HashMap<String, Regex>) -> Result<(), ProgramError> {
    match expr {
        Expr::Call { target, function, args, .. } => {
            if function == "matches"
                && let Some(Expr::String(pattern)) = args.last()
                && !patterns.contains_key(pattern)
            {
                let regex = Regex::new(pattern).map_err(|e| ProgramError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                patterns.insert(pattern.clone(), regex);
            }
            if let Some(target) = target {
                collect_patterns(target, patterns)?;
            }
            for arg in args {
                collect_patterns(arg, patterns)?;
            }
        }
        Expr::List(items) => {
            for item in items {
                collect_patterns(item, patterns)?;
            }
        }
        Expr::Map(entries) => {
            for (key, value) in entries {
                collect_patterns(key, patterns)?;
                collect_patterns(value, patterns)?;
            }
        }
        Expr::Select { operand, .. } | Expr::Unary(_, operand) => {
            collect_patterns(operand, patterns)?;
        }
        Expr::Index(left, right)
        | Expr::Binary(_, left, right)
        | Expr::And(left, right)
        | Expr::Or(left, right) => {
            collect_patterns(left, patterns)?;
            collect_patterns(right, patterns)?;
        }
        Expr::Conditional(condition, then, otherwise) => {
            collect_patterns(condition, patterns)?;
            collect_patterns(then, patterns)?;
            collect_patterns(otherwise, patterns)?;
        }
        Expr::Comprehension { range, body, filter, .. } => {
            collect_patterns(range, patterns)?;
            collect_patterns(body, patterns)?;
            if let Some(filter) = filter {
                collect_patterns(filter, patterns)?;
            }
        }
        Expr::Null
        | Expr::Bool(_)
        | Expr::Int(_)
        | Expr::Double(_)
        | Expr::String(_)
        | Expr::Type(_)
        | Expr::Ident { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::values::parse_document;

    fn run(source: &str, document: &str) -> Result<CelValue, EvalError> {
        let env = Environment::new().with_variable("values");
        let ast = env.compile(source).unwrap();
        let program = env.program(&ast).unwrap();
        let activation = Activation::new().bind_document("values", &parse_document(document).unwrap());
        program.evaluate(&activation)
    }

    fn truthy(source: &str, document: &str) -> bool {
        matches!(run(source, document), Ok(CelValue::Bool(true)))
    }

    const DOC: &str = "
service:
  type: ClusterIP
  port: 80
replicas: 3
ratio: 0.5
name: web-frontend
hosts:
  - name: a.example.com
    port: 443
  - name: b.example.com
    port: 8443
labels:
  app: web
empty: []
";

    #[test]
    fn test_field_access_and_comparison() {
        assert!(truthy("values.service.port <= 65535", DOC));
        assert!(truthy("values.service.type == 'ClusterIP'", DOC));
        assert!(!truthy("values.replicas > 5", DOC));
    }

    #[test]
    fn test_min_int_literal() {
        assert!(truthy("-9223372036854775808 < 0", DOC));
        assert_eq!(
            run("-9223372036854775808", DOC),
            Ok(CelValue::Int(i64::MIN))
        );
    }

    #[test]
    fn test_missing_key_error() {
        assert_eq!(
            run("values.service.nodePort > 0", DOC),
            Err(EvalError::NoSuchKey("nodePort".to_string()))
        );
    }

    #[test]
    fn test_has() {
        assert!(truthy("has(values.service) && has(values.service.port)", DOC));
        assert!(!truthy("has(values.ingress)", DOC));
    }

    #[test]
    fn test_logical_error_absorption() {
        assert!(truthy("values.missing > 0 || true", DOC));
        assert!(!truthy("values.missing > 0 && false", DOC));
        assert!(!truthy("false && values.missing > 0", DOC));
        assert_eq!(
            run("true && values.missing > 0", DOC),
            Err(EvalError::NoSuchKey("missing".to_string()))
        );
    }

    #[test]
    fn test_numeric_comparison_across_kinds() {
        assert!(truthy("values.ratio < 1", DOC));
        assert!(truthy("values.replicas == 3.0", DOC));
    }

    #[test]
    fn test_type_function() {
        assert!(truthy("type(values.replicas) == int", DOC));
        assert!(truthy("type(values.ratio) == double", DOC));
        assert!(truthy("type(values.name) == string", DOC));
        assert!(truthy("type(values.hosts) == list && type(values.labels) == map", DOC));
        assert!(truthy("type(values.replicas) == int || type(values.replicas) == double", DOC));
    }

    #[test]
    fn test_string_functions() {
        assert!(truthy("values.name.startsWith('web')", DOC));
        assert!(truthy("values.name.endsWith('frontend')", DOC));
        assert!(truthy("values.name.contains('-')", DOC));
        assert!(truthy("values.name.matches('^[a-z-]+$')", DOC));
        assert!(truthy("matches(values.name, 'front')", DOC));
        assert!(truthy("size(values.name) == 12", DOC));
        assert!(truthy("values.name.size() == 12", DOC));
    }

    #[test]
    fn test_comprehensions() {
        assert!(truthy("values.hosts.all(h, h.port > 0)", DOC));
        assert!(truthy("values.hosts.exists(h, h.port == 443)", DOC));
        assert!(truthy("values.hosts.exists_one(h, h.port > 1000)", DOC));
        assert!(truthy("size(values.hosts.filter(h, h.port > 1000)) == 1", DOC));
        assert!(truthy("values.hosts.map(h, h.port) == [443, 8443]", DOC));
        assert!(truthy("values.labels.all(k, k == 'app')", DOC));
        assert!(truthy("values.empty.all(x, false)", DOC));
        assert!(!truthy("values.empty.exists(x, true)", DOC));
    }

    #[test]
    fn test_in_operator() {
        assert!(truthy("values.service.type in ['ClusterIP', 'NodePort']", DOC));
        assert!(truthy("'app' in values.labels", DOC));
        assert!(!truthy("'tier' in values.labels", DOC));
    }

    #[test]
    fn test_index_access() {
        assert!(truthy("values.hosts[1].port == 8443", DOC));
        assert!(truthy("values.labels['app'] == 'web'", DOC));
        assert_eq!(
            run("values.hosts[5].port == 1", DOC),
            Err(EvalError::IndexOutOfRange { index: 5, size: 2 })
        );
    }

    #[test]
    fn test_conditional_and_arithmetic() {
        assert!(truthy("(values.replicas > 1 ? values.replicas * 2 : 1) == 6", DOC));
        assert!(truthy("values.replicas % 2 == 1 && -values.replicas == -3", DOC));
    }

    #[test]
    fn test_non_bool_result_is_returned() {
        assert_eq!(run("values.replicas", DOC), Ok(CelValue::Int(3)));
    }

    #[test]
    fn test_invalid_constant_pattern_rejected_by_program() {
        let env = Environment::new().with_variable("values");
        let ast = env.compile("values.name.matches('[')").unwrap();
        let err = env.program(&ast).unwrap_err();
        assert!(matches!(err, ProgramError::InvalidPattern { ref pattern, .. } if pattern == "["));
    }

    #[test]
    fn test_unbound_variable() {
        let env = Environment::new().with_variable("values");
        let program = env.program(&env.compile("has(values.a)").unwrap()).unwrap();
        assert_eq!(
            program.evaluate(&Activation::new()),
            Err(EvalError::NoSuchAttribute("values".to_string()))
        );
    }
}
