#![forbid(unsafe_code)]

//! Named expression (macro) expansion
//!
//! Rules may reference reusable expression bodies as `${name}` or
//! `${name(arg1, arg2)}`. Expansion replaces every reference with its body
//! wrapped in parentheses and repeats until no `${` is left. Bodies can
//! reference other bodies, so each pass resolves one more level; the number
//! of passes is capped at `macros + 1`, which is enough for any acyclic set
//! of definitions and guarantees termination for cyclic ones.

use crate::error::{ArityError, ExpandError};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

const REFERENCE_OPEN: &str = "${";

/// Expands macro references against a fixed table of named expressions
///
/// Expansion is a pure function of the expression and the table, so one
/// expander can be shared by every rule of a run and a failure in one rule
/// never affects another.
#[derive(Debug, Clone, Copy)]
pub struct MacroExpander<'a> {
    macros: &'a BTreeMap<String, String>,
}

impl<'a> MacroExpander<'a> {
    /// Creates an expander over the given name → body table
    pub fn new(macros: &'a BTreeMap<String, String>) -> Self {
        Self { macros }
    }

    /// Fully expands `expression`
    ///
    /// # Errors
    ///
    /// - `UndefinedReference` when a reference names an unknown macro (the
    ///   reference text is reported) or when `${` remains but no well-formed
    ///   reference can be found (the whole expression is reported).
    /// - `CircularReference` when expansion does not converge within the
    ///   pass budget.
    /// - `ParameterArity` when placeholders cannot be filled from the
    ///   written arguments.
    pub fn expand(&self, expression: &str) -> Result<String, ExpandError> {
        let budget = self.macros.len() + 1;
        let mut current = expression.to_string();
        let mut pass = 0;

        while current.contains(REFERENCE_OPEN) && pass < budget {
            pass += 1;

            let references = find_references(&current);
            if references.is_empty() {
                return Err(ExpandError::UndefinedReference(expression.to_string()));
            }

            let mut next = String::with_capacity(current.len());
            let mut cursor = 0;
            for reference in &references {
                let body = self
                    .macros
                    .get(reference.name)
                    .ok_or_else(|| ExpandError::UndefinedReference(reference.text.to_string()))?;

                let expanded = match reference.args {
                    Some(args) => {
                        let args = split_arguments(args);
                        Cow::Owned(substitute_parameters(body, &args).map_err(|reason| {
                            ExpandError::ParameterArity {
                                name: reference.name.to_string(),
                                reason,
                            }
                        })?)
                    }
                    None => Cow::Borrowed(body.as_str()),
                };

                next.push_str(&current[cursor..reference.span.start]);
                next.push('(');
                next.push_str(&expanded);
                next.push(')');
                cursor = reference.span.end;
            }
            next.push_str(&current[cursor..]);

            if next == current {
                return Err(ExpandError::CircularReference(expression.to_string()));
            }

            debug!(pass, references = references.len(), expanded = %next, "expansion pass");
            current = next;
        }

        if current.contains(REFERENCE_OPEN) {
            return Err(ExpandError::CircularReference(expression.to_string()));
        }

        Ok(current)
    }
}

/// Expands `expression` against `macros`
///
/// Convenience wrapper around [`MacroExpander::expand`].
pub fn expand(expression: &str, macros: &BTreeMap<String, String>) -> Result<String, ExpandError> {
    MacroExpander::new(macros).expand(expression)
}

/// One well-formed `${...}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference<'a> {
    /// Byte range of the whole occurrence, `${` through `}`
    span: Range<usize>,
    text: &'a str,
    name: &'a str,
    /// Text between the argument parentheses, when an argument list was written
    args: Option<&'a str>,
}

/// Finds every well-formed reference, left to right
///
/// A `${` that is not followed by a name, an optional balanced argument list
/// and a closing `}` is skipped here. It still contains `${`, so the caller
/// reports it instead of silently leaving it in the expanded text.
fn find_references(text: &str) -> Vec<Reference<'_>> {
    let bytes = text.as_bytes();
    let mut references = Vec::new();
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] != b'$' || bytes[i + 1] != b'{' {
            i += 1;
            continue;
        }

        let start = i;
        let name_start = i + 2;
        let mut end = name_start;
        while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
            end += 1;
        }
        let name = &text[name_start..end];

        let mut args = None;
        if end < bytes.len() && bytes[end] == b'(' {
            match matching_close(bytes, end) {
                Some(close) => {
                    args = Some(&text[end + 1..close]);
                    end = close + 1;
                }
                None => {
                    i = name_start;
                    continue;
                }
            }
        }

        if end < bytes.len() && bytes[end] == b'}' {
            references.push(Reference {
                span: start..end + 1,
                text: &text[start..end + 1],
                name,
                args,
            });
            i = end + 1;
        } else {
            i = name_start;
        }
    }

    references
}

/// Returns the index of the bracket closing the one at `open`
///
/// Brackets are matched with an explicit stack, so `(`, `[` and `{` may nest
/// in any combination. Brackets inside quoted strings are ignored and a
/// backslash escapes the following byte. Returns `None` for unbalanced or
/// mismatched input.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (pos, &byte) in bytes.iter().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        if byte == b'\\' {
            escaped = true;
            continue;
        }
        if let Some(q) = quote {
            if byte == q {
                quote = None;
            }
            continue;
        }

        match byte {
            b'\'' | b'"' => quote = Some(byte),
            b'(' | b'[' | b'{' => stack.push(byte),
            b')' | b']' | b'}' => {
                let expected = match byte {
                    b')' => b'(',
                    b']' => b'[',
                    _ => b'{',
                };
                if stack.pop() != Some(expected) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(pos);
                }
            }
            _ => {}
        }
    }

    None
}

/// Splits an argument list on top-level commas
///
/// Commas nested in brackets or quoted strings stay inside their argument.
/// Backslash escapes are copied through untouched. Every argument is trimmed
/// and a trailing empty argument is dropped.
fn split_arguments(args: &str) -> Vec<String> {
    let args = args.trim();
    if args.is_empty() {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = args.chars();

    while let Some(c) = chars.next() {
        let quoted = in_single || in_double;
        match c {
            '(' | '[' | '{' if !quoted => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' if !quoted => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            ',' if depth == 0 && !quoted => {
                result.push(current.trim().to_string());
                current.clear();
            }
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        result.push(current.trim().to_string());
    }

    result
}

/// Byte ranges and indices of `$N` placeholders in a macro body
fn placeholders(body: &str) -> Vec<(Range<usize>, Option<usize>)> {
    let bytes = body.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
            let mut end = i + 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            found.push((i..end, body[i + 1..end].parse().ok()));
            i = end;
        } else {
            i += 1;
        }
    }

    found
}

/// Replaces `$0`, `$1`, ... in `body` with the literal argument texts
fn substitute_parameters(body: &str, args: &[String]) -> Result<String, ArityError> {
    let found = placeholders(body);
    if found.is_empty() {
        return Ok(body.to_string());
    }
    if args.is_empty() {
        return Err(ArityError::MissingArguments);
    }

    let mut result = String::with_capacity(body.len());
    let mut cursor = 0;
    for (span, index) in found {
        let arg = index
            .and_then(|index| args.get(index))
            .ok_or(ArityError::NotEnoughArguments)?;
        result.push_str(&body[cursor..span.start]);
        result.push_str(arg);
        cursor = span.end;
    }
    result.push_str(&body[cursor..]);

    Ok(result)
}
