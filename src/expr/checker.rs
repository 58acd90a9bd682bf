//! Name resolution and macro lowering
//!
//! Runs after parsing. `has(x.f)` becomes a presence test, the
//! comprehension macros become [`Expr::Comprehension`] nodes, type names
//! become constants, and every remaining identifier and function call is
//! checked against what the environment and the builtin library provide.

use super::ast::{Expr, Quantifier};
use super::value::Kind;
use crate::error::CompileError;
use std::collections::BTreeSet;

/// Global functions and the argument counts they accept
const GLOBAL_FUNCTIONS: &[(&str, &[usize])] = &[
    ("size", &[1]),
    ("type", &[1]),
    ("int", &[1]),
    ("double", &[1]),
    ("string", &[1]),
    ("bool", &[1]),
    ("dyn", &[1]),
    ("matches", &[2]),
];

/// Receiver-style functions and the argument counts they accept
const METHODS: &[(&str, &[usize])] = &[
    ("size", &[0]),
    ("contains", &[1]),
    ("startsWith", &[1]),
    ("endsWith", &[1]),
    ("matches", &[1]),
];

pub(crate) struct Checker<'a> {
    source: &'a str,
    variables: &'a BTreeSet<String>,
    scopes: Vec<String>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(source: &'a str, variables: &'a BTreeSet<String>) -> Self {
        Checker {
            source,
            variables,
            scopes: Vec::new(),
        }
    }

    pub(crate) fn check(&mut self, expr: Expr) -> Result<Expr, CompileError> {
        Ok(match expr {
            Expr::Ident { name, tail } => self.resolve(name, tail)?,
            Expr::Select {
                operand,
                field,
                test_only,
            } => Expr::Select {
                operand: Box::new(self.check(*operand)?),
                field,
                test_only,
            },
            Expr::Index(operand, index) => Expr::Index(
                Box::new(self.check(*operand)?),
                Box::new(self.check(*index)?),
            ),
            Expr::List(items) => Expr::List(
                items
                    .into_iter()
                    .map(|item| self.check(item))
                    .collect::<Result<_, _>>()?,
            ),
            Expr::Map(entries) => Expr::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((self.check(k)?, self.check(v)?)))
                    .collect::<Result<_, CompileError>>()?,
            ),
            Expr::Unary(op, operand) => Expr::Unary(op, Box::new(self.check(*operand)?)),
            Expr::Binary(op, left, right) => Expr::Binary(
                op,
                Box::new(self.check(*left)?),
                Box::new(self.check(*right)?),
            ),
            Expr::And(left, right) => Expr::And(
                Box::new(self.check(*left)?),
                Box::new(self.check(*right)?),
            ),
            Expr::Or(left, right) => Expr::Or(
                Box::new(self.check(*left)?),
                Box::new(self.check(*right)?),
            ),
            Expr::Conditional(condition, then, otherwise) => Expr::Conditional(
                Box::new(self.check(*condition)?),
                Box::new(self.check(*then)?),
                Box::new(self.check(*otherwise)?),
            ),
            Expr::Call {
                target: None,
                function,
                args,
                tail,
            } => self.check_global_call(function, args, tail)?,
            Expr::Call {
                target: Some(target),
                function,
                args,
                tail,
            } => self.check_method_call(*target, function, args, tail)?,
            literal @ (Expr::Null
            | Expr::Bool(_)
            | Expr::Int(_)
            | Expr::Double(_)
            | Expr::String(_)
            | Expr::Type(_)
            | Expr::Comprehension { .. }) => literal,
        })
    }

    fn error(&self, tail: usize, message: String) -> CompileError {
        CompileError::at(self.source, self.source.len() - tail, message)
    }

    fn resolve(&self, name: String, tail: usize) -> Result<Expr, CompileError> {
        if self.scopes.iter().any(|scoped| *scoped == name) || self.variables.contains(&name) {
            return Ok(Expr::Ident { name, tail });
        }
        if let Some(kind) = Kind::from_name(&name) {
            return Ok(Expr::Type(kind));
        }
        Err(self.error(tail, undeclared(&name)))
    }

    fn check_global_call(
        &mut self,
        function: String,
        mut args: Vec<Expr>,
        tail: usize,
    ) -> Result<Expr, CompileError> {
        if function == "has" {
            return match args.pop() {
                Some(Expr::Select {
                    operand,
                    field,
                    test_only: false,
                }) if args.is_empty() => Ok(Expr::Select {
                    operand: Box::new(self.check(*operand)?),
                    field,
                    test_only: true,
                }),
                _ => Err(self.error(tail, "invalid argument to has() macro".to_string())),
            };
        }

        check_arity(GLOBAL_FUNCTIONS, &function, args.len())
            .map_err(|message| self.error(tail, message))?;

        Ok(Expr::Call {
            target: None,
            function,
            args: args
                .into_iter()
                .map(|arg| self.check(arg))
                .collect::<Result<_, _>>()?,
            tail,
        })
    }

    fn check_method_call(
        &mut self,
        target: Expr,
        function: String,
        args: Vec<Expr>,
        tail: usize,
    ) -> Result<Expr, CompileError> {
        if let Some(quantifier) = Quantifier::from_name(&function) {
            let accepts_filter = quantifier == Quantifier::Map;
            if args.len() == 2 || (accepts_filter && args.len() == 3) {
                return self.lower_comprehension(quantifier, target, args, tail);
            }
        }

        check_arity(METHODS, &function, args.len()).map_err(|message| self.error(tail, message))?;

        Ok(Expr::Call {
            target: Some(Box::new(self.check(target)?)),
            function,
            args: args
                .into_iter()
                .map(|arg| self.check(arg))
                .collect::<Result<_, _>>()?,
            tail,
        })
    }

    fn lower_comprehension(
        &mut self,
        quantifier: Quantifier,
        range: Expr,
        args: Vec<Expr>,
        tail: usize,
    ) -> Result<Expr, CompileError> {
        let mut args = args.into_iter();
        let var = match args.next() {
            Some(Expr::Ident { name, .. }) => name,
            _ => return Err(self.error(tail, "argument must be a simple name".to_string())),
        };
        let range = self.check(range)?;

        // Three-argument map is `map(var, filter, transform)`.
        let (filter, body) = match (args.next(), args.next()) {
            (Some(filter), Some(transform)) => (Some(filter), transform),
            (Some(body), None) => (None, body),
            _ => return Err(self.error(tail, "argument must be a simple name".to_string())),
        };

        self.scopes.push(var.clone());
        let filter = filter.map(|f| self.check(f)).transpose();
        let body = self.check(body);
        self.scopes.pop();

        Ok(Expr::Comprehension {
            quantifier,
            range: Box::new(range),
            var,
            body: Box::new(body?),
            filter: filter?.map(Box::new),
        })
    }
}

fn undeclared(name: &str) -> String {
    format!("undeclared reference to '{}' (in container '')", name)
}

fn check_arity(table: &[(&str, &[usize])], function: &str, count: usize) -> Result<(), String> {
    match table.iter().find(|(name, _)| *name == function) {
        None => Err(undeclared(function)),
        Some((_, counts)) if counts.contains(&count) => Ok(()),
        Some(_) => Err(format!(
            "found no matching overload for '{}' applied to {} argument(s)",
            function, count
        )),
    }
}
