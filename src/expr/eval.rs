//! Tree-walking interpreter for checked expressions

use super::Activation;
use super::ast::{BinaryOp, Expr, Quantifier, UnaryOp};
use super::value::CelValue;
use crate::error::EvalError;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Comprehension variables in scope, innermost last
type Locals<'e> = Vec<(&'e str, CelValue)>;

pub(crate) struct Interpreter<'p> {
    activation: &'p Activation,
    patterns: &'p HashMap<String, Regex>,
}

impl<'p> Interpreter<'p> {
    pub(crate) fn new(activation: &'p Activation, patterns: &'p HashMap<String, Regex>) -> Self {
        Interpreter {
            activation,
            patterns,
        }
    }

    pub(crate) fn run(&self, expr: &Expr) -> Result<CelValue, EvalError> {
        self.eval(expr, &mut Vec::new())
    }

    fn eval<'e>(&self, expr: &'e Expr, locals: &mut Locals<'e>) -> Result<CelValue, EvalError> {
        match expr {
            Expr::Null => Ok(CelValue::Null),
            Expr::Bool(b) => Ok(CelValue::Bool(*b)),
            Expr::Int(i) => Ok(CelValue::Int(*i)),
            Expr::Double(d) => Ok(CelValue::Double(*d)),
            Expr::String(s) => Ok(CelValue::string(s.as_str())),
            Expr::Type(kind) => Ok(CelValue::Type(*kind)),
            Expr::List(items) => Ok(CelValue::list(
                items
                    .iter()
                    .map(|item| self.eval(item, locals))
                    .collect::<Result<_, _>>()?,
            )),
            Expr::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    let key = match self.eval(key, locals)? {
                        CelValue::String(s) => s.to_string(),
                        other => {
                            return Err(EvalError::InvalidArgument(format!(
                                "unsupported map key type '{}'",
                                other.kind()
                            )));
                        }
                    };
                    let value = self.eval(value, locals)?;
                    if map.insert(key.clone(), value).is_some() {
                        return Err(EvalError::InvalidArgument(format!(
                            "repeated map key '{}'",
                            key
                        )));
                    }
                }
                Ok(CelValue::map(map))
            }
            Expr::Ident { name, .. } => self.lookup(name, locals),
            Expr::Select {
                operand,
                field,
                test_only,
            } => select(self.eval(operand, locals)?, field, *test_only),
            Expr::Index(operand, index) => {
                index_value(self.eval(operand, locals)?, self.eval(index, locals)?)
            }
            Expr::Call {
                target,
                function,
                args,
                ..
            } => {
                let receiver = target
                    .as_deref()
                    .map(|t| self.eval(t, locals))
                    .transpose()?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, locals))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(function, receiver, args)
            }
            Expr::Unary(op, operand) => unary(*op, self.eval(operand, locals)?),
            Expr::Binary(op, left, right) => {
                binary(*op, self.eval(left, locals)?, self.eval(right, locals)?)
            }
            Expr::And(left, right) => self.logical(left, right, false, locals),
            Expr::Or(left, right) => self.logical(left, right, true, locals),
            Expr::Conditional(condition, then, otherwise) => {
                match self.eval(condition, locals)? {
                    CelValue::Bool(true) => self.eval(then, locals),
                    CelValue::Bool(false) => self.eval(otherwise, locals),
                    other => Err(overload("_?_:_", &[&other])),
                }
            }
            Expr::Comprehension {
                quantifier,
                range,
                var,
                body,
                filter,
            } => {
                let items = match self.eval(range, locals)? {
                    CelValue::List(items) => items.to_vec(),
                    CelValue::Map(map) => map.keys().map(|k| CelValue::string(k.as_str())).collect(),
                    other => {
                        return Err(overload(
                            &format!("{}()", quantifier_name(*quantifier)),
                            &[&other],
                        ));
                    }
                };
                self.comprehension(*quantifier, items, var, body, filter.as_deref(), locals)
            }
        }
    }

    fn lookup(&self, name: &str, locals: &Locals<'_>) -> Result<CelValue, EvalError> {
        if let Some((_, value)) = locals.iter().rev().find(|(scoped, _)| *scoped == name) {
            return Ok(value.clone());
        }
        self.activation
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::NoSuchAttribute(name.to_string()))
    }

    /// `&&` when `short_circuit` is false, `||` when it is true
    ///
    /// Either side equal to `short_circuit` decides the result even if the
    /// other side failed.
    fn logical<'e>(
        &self,
        left: &'e Expr,
        right: &'e Expr,
        short_circuit: bool,
        locals: &mut Locals<'e>,
    ) -> Result<CelValue, EvalError> {
        let function = if short_circuit { "_||_" } else { "_&&_" };

        let left = self.eval(left, locals);
        if matches!(left, Ok(CelValue::Bool(b)) if b == short_circuit) {
            return Ok(CelValue::Bool(short_circuit));
        }
        let right = self.eval(right, locals);

        match (left, right) {
            (_, Ok(CelValue::Bool(b))) if b == short_circuit => Ok(CelValue::Bool(short_circuit)),
            (Ok(CelValue::Bool(_)), Ok(CelValue::Bool(_))) => Ok(CelValue::Bool(!short_circuit)),
            (Err(e), _) | (_, Err(e)) => Err(e),
            (Ok(left), Ok(right)) => Err(overload(function, &[&left, &right])),
        }
    }

    fn comprehension<'e>(
        &self,
        quantifier: Quantifier,
        items: Vec<CelValue>,
        var: &'e str,
        body: &'e Expr,
        filter: Option<&'e Expr>,
        locals: &mut Locals<'e>,
    ) -> Result<CelValue, EvalError> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            locals.push((var, item.clone()));
            let keep = match filter {
                Some(filter) => self.eval(filter, locals),
                None => Ok(CelValue::Bool(true)),
            };
            let result = match keep {
                Ok(CelValue::Bool(true)) => Some(self.eval(body, locals)),
                Ok(CelValue::Bool(false)) => None,
                Ok(other) => Some(Err(overload("map()", &[&other]))),
                Err(e) => Some(Err(e)),
            };
            locals.pop();
            if let Some(result) = result {
                results.push((item, result));
            }
        }

        match quantifier {
            Quantifier::All => fold_logical(results, false),
            Quantifier::Exists => fold_logical(results, true),
            Quantifier::ExistsOne => {
                let mut count = 0;
                for (_, result) in results {
                    match result? {
                        CelValue::Bool(true) => count += 1,
                        CelValue::Bool(false) => {}
                        other => return Err(overload("exists_one()", &[&other])),
                    }
                }
                Ok(CelValue::Bool(count == 1))
            }
            Quantifier::Filter => {
                let mut kept = Vec::new();
                for (item, result) in results {
                    match result? {
                        CelValue::Bool(true) => kept.push(item),
                        CelValue::Bool(false) => {}
                        other => return Err(overload("filter()", &[&other])),
                    }
                }
                Ok(CelValue::list(kept))
            }
            Quantifier::Map => Ok(CelValue::list(
                results
                    .into_iter()
                    .map(|(_, result)| result)
                    .collect::<Result<_, _>>()?,
            )),
        }
    }

    fn call(
        &self,
        function: &str,
        receiver: Option<CelValue>,
        args: Vec<CelValue>,
    ) -> Result<CelValue, EvalError> {
        // Receiver-style calls see the receiver as their first argument.
        let args: Vec<CelValue> = receiver.into_iter().chain(args).collect();

        match (function, args.as_slice()) {
            ("size", [value]) => size(value),
            ("type", [value]) => Ok(CelValue::Type(value.kind())),
            ("dyn", [value]) => Ok(value.clone()),
            ("int", [value]) => to_int(value),
            ("double", [value]) => to_double(value),
            ("string", [value]) => to_string(value),
            ("bool", [value]) => to_bool(value),
            ("matches", [CelValue::String(text), CelValue::String(pattern)]) => {
                self.matches(text, pattern)
            }
            ("contains", [CelValue::String(text), CelValue::String(needle)]) => {
                Ok(CelValue::Bool(text.contains(&**needle)))
            }
            ("startsWith", [CelValue::String(text), CelValue::String(prefix)]) => {
                Ok(CelValue::Bool(text.starts_with(&**prefix)))
            }
            ("endsWith", [CelValue::String(text), CelValue::String(suffix)]) => {
                Ok(CelValue::Bool(text.ends_with(&**suffix)))
            }
            _ => Err(overload(function, &args.iter().collect::<Vec<_>>())),
        }
    }

    fn matches(&self, text: &str, pattern: &str) -> Result<CelValue, EvalError> {
        if let Some(regex) = self.patterns.get(pattern) {
            return Ok(CelValue::Bool(regex.is_match(text)));
        }
        let regex = Regex::new(pattern).map_err(|e| {
            EvalError::InvalidArgument(format!("invalid regular expression '{}': {}", pattern, e))
        })?;
        Ok(CelValue::Bool(regex.is_match(text)))
    }
}

fn quantifier_name(quantifier: Quantifier) -> &'static str {
    match quantifier {
        Quantifier::All => "all",
        Quantifier::Exists => "exists",
        Quantifier::ExistsOne => "exists_one",
        Quantifier::Filter => "filter",
        Quantifier::Map => "map",
    }
}

/// Folds `all` (`decisive` false) or `exists` (`decisive` true) results
/// with the same error absorption as `&&` and `||`
fn fold_logical(
    results: Vec<(CelValue, Result<CelValue, EvalError>)>,
    decisive: bool,
) -> Result<CelValue, EvalError> {
    let mut first_error = None;
    for (_, result) in results {
        match result {
            Ok(CelValue::Bool(b)) if b == decisive => return Ok(CelValue::Bool(decisive)),
            Ok(CelValue::Bool(_)) => {}
            Ok(other) => {
                let name = if decisive { "exists()" } else { "all()" };
                first_error.get_or_insert(overload(name, &[&other]));
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(CelValue::Bool(!decisive)),
    }
}

fn overload(function: &str, args: &[&CelValue]) -> EvalError {
    let kinds: Vec<&str> = args.iter().map(|a| a.kind().name()).collect();
    EvalError::NoSuchOverload(format!("{}({})", function, kinds.join(", ")))
}

fn select(operand: CelValue, field: &str, test_only: bool) -> Result<CelValue, EvalError> {
    match operand {
        CelValue::Map(map) if test_only => Ok(CelValue::Bool(map.contains_key(field))),
        CelValue::Map(map) => map
            .get(field)
            .cloned()
            .ok_or_else(|| EvalError::NoSuchKey(field.to_string())),
        other => Err(EvalError::NoFieldSelection(other.kind().to_string())),
    }
}

fn index_value(operand: CelValue, index: CelValue) -> Result<CelValue, EvalError> {
    match (&operand, &index) {
        (CelValue::List(items), CelValue::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or(EvalError::IndexOutOfRange {
                index: *i,
                size: items.len(),
            }),
        (CelValue::Map(map), CelValue::String(key)) => map
            .get(&**key)
            .cloned()
            .ok_or_else(|| EvalError::NoSuchKey(key.to_string())),
        _ => Err(overload("_[_]", &[&operand, &index])),
    }
}

fn unary(op: UnaryOp, operand: CelValue) -> Result<CelValue, EvalError> {
    match (op, &operand) {
        (UnaryOp::Not, CelValue::Bool(b)) => Ok(CelValue::Bool(!b)),
        (UnaryOp::Neg, CelValue::Int(i)) => i.checked_neg().map(CelValue::Int).ok_or(EvalError::Overflow),
        (UnaryOp::Neg, CelValue::Double(d)) => Ok(CelValue::Double(-d)),
        (UnaryOp::Not, _) => Err(overload("!_", &[&operand])),
        (UnaryOp::Neg, _) => Err(overload("-_", &[&operand])),
    }
}

fn binary(op: BinaryOp, left: CelValue, right: CelValue) -> Result<CelValue, EvalError> {
    use CelValue::{Double, Int, List};

    let mismatch = || overload(&format!("_{}_", op.symbol()), &[&left, &right]);

    match op {
        BinaryOp::Eq => Ok(CelValue::Bool(left.equals(&right))),
        BinaryOp::Ne => Ok(CelValue::Bool(!left.equals(&right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = left.compare(&right).ok_or_else(mismatch)?;
            Ok(CelValue::Bool(match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinaryOp::In => match &right {
            List(items) => Ok(CelValue::Bool(items.iter().any(|item| item.equals(&left)))),
            CelValue::Map(map) => Ok(CelValue::Bool(match &left {
                CelValue::String(key) => map.contains_key(&**key),
                _ => false,
            })),
            _ => Err(mismatch()),
        },
        BinaryOp::Add => match (&left, &right) {
            (Int(a), Int(b)) => a.checked_add(*b).map(Int).ok_or(EvalError::Overflow),
            (Double(a), Double(b)) => Ok(Double(a + b)),
            (CelValue::String(a), CelValue::String(b)) => Ok(CelValue::string(format!("{}{}", a, b))),
            (List(a), List(b)) => Ok(CelValue::list(a.iter().chain(b.iter()).cloned().collect())),
            _ => Err(mismatch()),
        },
        BinaryOp::Sub => match (&left, &right) {
            (Int(a), Int(b)) => a.checked_sub(*b).map(Int).ok_or(EvalError::Overflow),
            (Double(a), Double(b)) => Ok(Double(a - b)),
            _ => Err(mismatch()),
        },
        BinaryOp::Mul => match (&left, &right) {
            (Int(a), Int(b)) => a.checked_mul(*b).map(Int).ok_or(EvalError::Overflow),
            (Double(a), Double(b)) => Ok(Double(a * b)),
            _ => Err(mismatch()),
        },
        BinaryOp::Div => match (&left, &right) {
            (Int(_), Int(0)) => Err(EvalError::DivisionByZero),
            (Int(a), Int(b)) => a.checked_div(*b).map(Int).ok_or(EvalError::Overflow),
            (Double(a), Double(b)) => Ok(Double(a / b)),
            _ => Err(mismatch()),
        },
        BinaryOp::Mod => match (&left, &right) {
            (Int(_), Int(0)) => Err(EvalError::ModulusByZero),
            (Int(a), Int(b)) => a.checked_rem(*b).map(Int).ok_or(EvalError::Overflow),
            _ => Err(mismatch()),
        },
    }
}

fn size(value: &CelValue) -> Result<CelValue, EvalError> {
    let len = match value {
        CelValue::String(s) => s.chars().count(),
        CelValue::List(items) => items.len(),
        CelValue::Map(map) => map.len(),
        other => return Err(overload("size", &[other])),
    };
    i64::try_from(len).map(CelValue::Int).map_err(|_| EvalError::Overflow)
}

fn to_int(value: &CelValue) -> Result<CelValue, EvalError> {
    match value {
        CelValue::Int(i) => Ok(CelValue::Int(*i)),
        CelValue::Double(d) => {
            if d.is_finite() && *d > i64::MIN as f64 && *d < i64::MAX as f64 {
                Ok(CelValue::Int(d.trunc() as i64))
            } else {
                Err(EvalError::InvalidArgument(format!("double {} out of int range", d)))
            }
        }
        CelValue::String(s) => s
            .parse::<i64>()
            .map(CelValue::Int)
            .map_err(|_| EvalError::InvalidArgument(format!("cannot convert '{}' to int", s))),
        other => Err(overload("int", &[other])),
    }
}

fn to_double(value: &CelValue) -> Result<CelValue, EvalError> {
    match value {
        CelValue::Double(d) => Ok(CelValue::Double(*d)),
        CelValue::Int(i) => Ok(CelValue::Double(*i as f64)),
        CelValue::String(s) => s
            .parse::<f64>()
            .map(CelValue::Double)
            .map_err(|_| EvalError::InvalidArgument(format!("cannot convert '{}' to double", s))),
        other => Err(overload("double", &[other])),
    }
}

fn to_string(value: &CelValue) -> Result<CelValue, EvalError> {
    match value {
        CelValue::String(_) => Ok(value.clone()),
        CelValue::Int(_) | CelValue::Double(_) | CelValue::Bool(_) => {
            Ok(CelValue::string(value.to_string()))
        }
        CelValue::Type(kind) => Ok(CelValue::string(kind.name())),
        other => Err(overload("string", &[other])),
    }
}

fn to_bool(value: &CelValue) -> Result<CelValue, EvalError> {
    match value {
        CelValue::Bool(b) => Ok(CelValue::Bool(*b)),
        CelValue::String(s) => match &**s {
            "1" | "t" | "true" | "TRUE" | "True" => Ok(CelValue::Bool(true)),
            "0" | "f" | "false" | "FALSE" | "False" => Ok(CelValue::Bool(false)),
            _ => Err(EvalError::InvalidArgument(format!("cannot convert '{}' to bool", s))),
        },
        other => Err(overload("bool", &[other])),
    }
}
