//! Recursive descent parser for rule expressions
//!
//! Token recognition uses `nom`; precedence is climbed by hand with one
//! function per level, loosest first: `?:`, `||`, `&&`, relations
//! (`== != < <= > >= in`), `+ -`, `* / %`, unary `! -`, then postfix
//! selection, indexing and calls.

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::CompileError;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, hex_digit1, one_of},
    combinator::{cut, opt, recognize},
    error::{ErrorKind, ParseError},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
};
use std::cell::Cell;

/// Parser error carrying the remaining input at the failure point
#[derive(Debug, PartialEq)]
pub(crate) struct SyntaxError<'a> {
    input: &'a str,
    message: Option<String>,
}

impl<'a> SyntaxError<'a> {
    fn new(input: &'a str, message: impl Into<String>) -> Self {
        SyntaxError {
            input,
            message: Some(message.into()),
        }
    }
}

impl<'a> ParseError<&'a str> for SyntaxError<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        SyntaxError {
            input,
            message: None,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // Keep whichever alternative got further.
    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxError<'a>>;

/// Deepest expression tree the parser will build
///
/// Nested groups, prefix operators, postfix selections and chained binary
/// operators each count one level.
pub const MAX_DEPTH: usize = 250;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of nesting until dropped
struct DepthGuard;

impl DepthGuard {
    fn enter(input: &str) -> Result<Self, nom::Err<SyntaxError<'_>>> {
        DEPTH.with(|depth| {
            let next = depth.get() + 1;
            if next > MAX_DEPTH {
                return Err(nom::Err::Failure(SyntaxError::new(
                    input,
                    format!("expression recursion limit exceeded: {}", MAX_DEPTH),
                )));
            }
            depth.set(next);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Parse a complete expression
pub fn parse(source: &str) -> Result<Expr, CompileError> {
    match expression(source) {
        Ok((rest, expr)) => {
            if rest.is_empty() {
                Ok(expr)
            } else {
                Err(CompileError::at(
                    source,
                    source.len() - rest.len(),
                    format!(
                        "Syntax error: mismatched input '{}' expecting <EOF>",
                        token_at(rest)
                    ),
                ))
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let message = e.message.unwrap_or_else(|| unexpected(e.input));
            Err(CompileError::at(
                source,
                source.len() - e.input.len(),
                format!("Syntax error: {}", message),
            ))
        }
        Err(nom::Err::Incomplete(_)) => Err(CompileError::at(
            source,
            source.len(),
            "Syntax error: unexpected end of input",
        )),
    }
}

fn unexpected(input: &str) -> String {
    if input.is_empty() {
        "unexpected end of input".to_string()
    } else {
        format!("unexpected token '{}'", token_at(input))
    }
}

/// The token starting at `input`, for error messages
fn token_at(input: &str) -> &str {
    let end = match input.chars().next() {
        None => return "<EOF>",
        Some(c) if is_ident_char(c) => input
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(input.len()),
        Some(c) => c.len_utf8(),
    };
    &input[..end]
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

/// Skip whitespace and `//` line comments
fn sp(input: &str) -> PResult<'_, ()> {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        match trimmed.strip_prefix("//") {
            Some(comment) => rest = comment.find('\n').map_or("", |i| &comment[i..]),
            None => return Ok((trimmed, ())),
        }
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(sp, inner, sp)
}

// ---------------------------------------------------------------------------
// Atoms
// ---------------------------------------------------------------------------

fn atom(input: &str) -> PResult<'_, Expr> {
    let (input, _) = sp(input)?;
    alt((
        number,
        string_literal,
        list_literal,
        map_literal,
        paren,
        ident_or_call,
    ))(input)
}

fn number(input: &str) -> PResult<'_, Expr> {
    if let Ok((rest, digits)) =
        preceded(alt((tag("0x"), tag("0X"))), hex_digit1::<_, SyntaxError>)(input)
    {
        return i64::from_str_radix(digits, 16)
            .map(|n| (rest, Expr::Int(n)))
            .map_err(|_| nom::Err::Failure(SyntaxError::new(input, "integer literal out of range")));
    }

    let (rest, text) = recognize(tuple((
        digit1,
        opt(pair(char('.'), digit1)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>()
            .map(|d| (rest, Expr::Double(d)))
            .map_err(|_| nom::Err::Failure(SyntaxError::new(input, "invalid double literal")))
    } else {
        text.parse::<i64>()
            .map(|n| (rest, Expr::Int(n)))
            .map_err(|_| nom::Err::Failure(SyntaxError::new(input, "integer literal out of range")))
    }
}

/// The one integer literal that only fits with a leading minus
fn min_int(input: &str) -> PResult<'_, Expr> {
    let (rest, _) = tag("9223372036854775808")(input)?;
    if rest.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E')) {
        return Err(nom::Err::Error(SyntaxError::from_error_kind(
            input,
            ErrorKind::Tag,
        )));
    }
    Ok((rest, Expr::Int(i64::MIN)))
}

/// Single- or double-quoted string, optionally raw with an `r` prefix
fn string_literal(input: &str) -> PResult<'_, Expr> {
    let (quoted, raw) = match input.strip_prefix(['r', 'R']) {
        Some(rest) if rest.starts_with(['"', '\'']) => (rest, true),
        _ => (input, false),
    };
    let quote = match quoted.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Err(nom::Err::Error(SyntaxError::from_error_kind(input, ErrorKind::Char))),
    };

    let body = &quoted[1..];
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Ok((&body[i + 1..], Expr::String(out)));
        }
        match c {
            '\n' | '\r' => break,
            '\\' if !raw => {
                let escape = &body[i..];
                let invalid = || nom::Err::Failure(SyntaxError::new(escape, "invalid escape sequence"));
                let Some((_, e)) = chars.next() else {
                    break;
                };
                let decoded = match e {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    'a' => '\u{07}',
                    'b' => '\u{08}',
                    'f' => '\u{0c}',
                    'v' => '\u{0b}',
                    '\\' | '"' | '\'' | '`' | '?' => e,
                    'x' | 'u' | 'U' => {
                        let width = match e {
                            'x' => 2,
                            'u' => 4,
                            _ => 8,
                        };
                        let mut code = 0u32;
                        for _ in 0..width {
                            let digit = chars
                                .next()
                                .and_then(|(_, d)| d.to_digit(16))
                                .ok_or_else(invalid)?;
                            code = code * 16 + digit;
                        }
                        char::from_u32(code).ok_or_else(invalid)?
                    }
                    _ => return Err(invalid()),
                };
                out.push(decoded);
            }
            _ => out.push(c),
        }
    }

    Err(nom::Err::Failure(SyntaxError::new(
        input,
        "unterminated string literal",
    )))
}

fn list_literal(input: &str) -> PResult<'_, Expr> {
    let (input, _) = char('[')(input)?;
    let (input, items) = separated_list0(ws(char(',')), expression)(input)?;
    let (input, _) = opt(ws(char(',')))(input)?;
    let (input, _) = cut(ws(char(']')))(input)?;
    Ok((input, Expr::List(items)))
}

fn map_literal(input: &str) -> PResult<'_, Expr> {
    let (input, _) = char('{')(input)?;
    let (input, entries) = separated_list0(ws(char(',')), map_entry)(input)?;
    let (input, _) = opt(ws(char(',')))(input)?;
    let (input, _) = cut(ws(char('}')))(input)?;
    Ok((input, Expr::Map(entries)))
}

fn map_entry(input: &str) -> PResult<'_, (Expr, Expr)> {
    let (input, key) = expression(input)?;
    let (input, _) = cut(ws(char(':')))(input)?;
    let (input, value) = cut(expression)(input)?;
    Ok((input, (key, value)))
}

fn paren(input: &str) -> PResult<'_, Expr> {
    let (input, _) = char('(')(input)?;
    let (input, expr) = cut(expression)(input)?;
    let (input, _) = cut(ws(char(')')))(input)?;
    Ok((input, expr))
}

/// An identifier matching `[A-Za-z_][A-Za-z0-9_]*`
fn ident(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_ident_char),
    ))(input)
}

/// Keyword literal, plain identifier, or global function call
fn ident_or_call(input: &str) -> PResult<'_, Expr> {
    let tail = input.len();
    let (rest, name) = ident(input)?;
    match name {
        "null" => return Ok((rest, Expr::Null)),
        "true" => return Ok((rest, Expr::Bool(true))),
        "false" => return Ok((rest, Expr::Bool(false))),
        "in" => {
            return Err(nom::Err::Error(SyntaxError::from_error_kind(
                input,
                ErrorKind::Tag,
            )));
        }
        _ => {}
    }

    let (after, _) = sp(rest)?;
    if let Some(args_start) = after.strip_prefix('(') {
        let (rest, args) = arguments(args_start)?;
        return Ok((
            rest,
            Expr::Call {
                target: None,
                function: name.to_string(),
                args,
                tail,
            },
        ));
    }

    Ok((
        rest,
        Expr::Ident {
            name: name.to_string(),
            tail,
        },
    ))
}

/// Call arguments, after the opening parenthesis
fn arguments(input: &str) -> PResult<'_, Vec<Expr>> {
    let (input, args) = separated_list0(ws(char(',')), expression)(input)?;
    let (input, _) = cut(ws(char(')')))(input)?;
    Ok((input, args))
}

// ---------------------------------------------------------------------------
// Postfix and unary
// ---------------------------------------------------------------------------

/// `.field`, `.method(args)` and `[index]` chains
fn postfix(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut expr) = atom(input)?;
    let mut depth = Vec::new();

    loop {
        let (next, _) = sp(input)?;

        if let Some(after_dot) = next.strip_prefix('.') {
            depth.push(DepthGuard::enter(next)?);
            let (after_dot, _) = sp(after_dot)?;
            let tail = after_dot.len();
            let (rest, field) = cut(ident)(after_dot)?;
            let (after, _) = sp(rest)?;
            if let Some(args_start) = after.strip_prefix('(') {
                let (rest, args) = arguments(args_start)?;
                expr = Expr::Call {
                    target: Some(Box::new(expr)),
                    function: field.to_string(),
                    args,
                    tail,
                };
                input = rest;
            } else {
                expr = Expr::Select {
                    operand: Box::new(expr),
                    field: field.to_string(),
                    test_only: false,
                };
                input = rest;
            }
            continue;
        }

        if let Some(after_bracket) = next.strip_prefix('[') {
            depth.push(DepthGuard::enter(next)?);
            let (rest, index) = cut(expression)(after_bracket)?;
            let (rest, _) = cut(ws(char(']')))(rest)?;
            expr = Expr::Index(Box::new(expr), Box::new(index));
            input = rest;
            continue;
        }

        return Ok((next, expr));
    }
}

fn unary(input: &str) -> PResult<'_, Expr> {
    let (input, _) = sp(input)?;

    if let Some(rest) = input.strip_prefix('!') {
        let _depth = DepthGuard::enter(input)?;
        let (rest, operand) = cut(unary)(rest)?;
        return Ok((rest, Expr::Unary(UnaryOp::Not, Box::new(operand))));
    }

    if let Some(rest) = input.strip_prefix('-') {
        if let Ok(literal) = min_int(rest) {
            return Ok(literal);
        }
        let _depth = DepthGuard::enter(input)?;
        let (rest, operand) = cut(unary)(rest)?;
        return Ok((rest, Expr::Unary(UnaryOp::Neg, Box::new(operand))));
    }

    postfix(input)
}

// ---------------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------------

fn multiplicative(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = unary(input)?;
    let mut depth = Vec::new();

    loop {
        let (next, _) = sp(input)?;
        let op = match next.chars().next() {
            Some('*') => BinaryOp::Mul,
            Some('/') => BinaryOp::Div,
            Some('%') => BinaryOp::Mod,
            _ => return Ok((next, left)),
        };
        depth.push(DepthGuard::enter(next)?);
        let (rest, right) = cut(unary)(&next[1..])?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
        input = rest;
    }
}

fn additive(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = multiplicative(input)?;
    let mut depth = Vec::new();

    loop {
        let (next, _) = sp(input)?;
        let op = match next.chars().next() {
            Some('+') => BinaryOp::Add,
            Some('-') => BinaryOp::Sub,
            _ => return Ok((next, left)),
        };
        depth.push(DepthGuard::enter(next)?);
        let (rest, right) = cut(multiplicative)(&next[1..])?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
        input = rest;
    }
}

fn relation_op(input: &str) -> Option<(BinaryOp, usize)> {
    const OPERATORS: [(&str, BinaryOp); 6] = [
        ("==", BinaryOp::Eq),
        ("!=", BinaryOp::Ne),
        ("<=", BinaryOp::Le),
        (">=", BinaryOp::Ge),
        ("<", BinaryOp::Lt),
        (">", BinaryOp::Gt),
    ];

    for (symbol, op) in OPERATORS {
        if input.starts_with(symbol) {
            return Some((op, symbol.len()));
        }
    }

    match input.strip_prefix("in") {
        Some(rest) if !rest.starts_with(is_ident_char) => Some((BinaryOp::In, 2)),
        _ => None,
    }
}

fn relation(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = additive(input)?;
    let mut depth = Vec::new();

    loop {
        let (next, _) = sp(input)?;
        let Some((op, len)) = relation_op(next) else {
            return Ok((next, left));
        };
        depth.push(DepthGuard::enter(next)?);
        let (rest, right) = cut(additive)(&next[len..])?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
        input = rest;
    }
}

fn and(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = relation(input)?;
    let mut depth = Vec::new();

    loop {
        let (next, _) = sp(input)?;
        let Some(rest) = next.strip_prefix("&&") else {
            return Ok((next, left));
        };
        depth.push(DepthGuard::enter(next)?);
        let (rest, right) = cut(relation)(rest)?;
        left = Expr::And(Box::new(left), Box::new(right));
        input = rest;
    }
}

fn or(input: &str) -> PResult<'_, Expr> {
    let (mut input, mut left) = and(input)?;
    let mut depth = Vec::new();

    loop {
        let (next, _) = sp(input)?;
        let Some(rest) = next.strip_prefix("||") else {
            return Ok((next, left));
        };
        depth.push(DepthGuard::enter(next)?);
        let (rest, right) = cut(and)(rest)?;
        left = Expr::Or(Box::new(left), Box::new(right));
        input = rest;
    }
}

/// Top level: `condition ? then : otherwise`
fn expression(input: &str) -> PResult<'_, Expr> {
    let _depth = DepthGuard::enter(input)?;
    let (input, condition) = or(input)?;
    let Some(rest) = input.strip_prefix('?') else {
        return Ok((input, condition));
    };

    let (rest, then) = cut(or)(rest)?;
    let (rest, _) = cut(ws(char(':')))(rest)?;
    let (rest, otherwise) = cut(expression)(rest)?;
    Ok((
        rest,
        Expr::Conditional(Box::new(condition), Box::new(then), Box::new(otherwise)),
    ))
}
