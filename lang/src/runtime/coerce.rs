//! Operand classification and conversion.
//!
//! Every operator resolves its operands through this module, in one order:
//! parenthesized subexpression, then a bound variable of the wanted type,
//! then a literal of that type's grammar.

use crate::runtime::{
    Context, RuntimeError,
    RuntimeError::{TypeMismatch, VariableNotFound, VariableTypeMismatch},
    Type,
    Value::{self, BoolValue, NumberValue, StringValue},
};

const SNAP_EPSILON: f64 = 1e-6;

pub fn is_string(tok: &str) -> bool {
    tok.len() >= 2 && tok.starts_with('"') && tok.ends_with('"')
}

pub fn is_parens(tok: &str) -> bool {
    tok.len() >= 2 && tok.starts_with('(') && tok.ends_with(')')
}

pub fn remove_quotes(tok: &str) -> &str {
    match is_string(tok) {
        true => &tok[1..tok.len() - 1],
        false => tok,
    }
}

pub fn remove_parens(tok: &str) -> &str {
    match is_parens(tok) {
        true => &tok[1..tok.len() - 1],
        false => tok,
    }
}

/// Payload of a quoted literal, with `\"` and `\\` unescaped.
pub fn string_payload(tok: &str) -> String {
    let mut payload = String::with_capacity(tok.len());
    let mut chars = remove_quotes(tok).chars();
    while let Some(c) = chars.next() {
        match (c, chars.clone().next()) {
            ('\\', Some(next)) if next == '"' || next == '\\' => {
                payload.push(next);
                chars.next();
            }
            _ => payload.push(c),
        }
    }
    payload
}

/// `-?[0-9]+`
pub fn is_integer_literal(tok: &str) -> bool {
    let digits = tok.strip_prefix('-').unwrap_or(tok);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn is_bool_literal(tok: &str) -> bool {
    matches!(tok, "true" | "false" | "0" | "1")
}

pub fn is_number(tok: &str, ctx: &Context) -> bool {
    match ctx.lookup(tok) {
        Some(NumberValue(_)) => true,
        _ => is_integer_literal(tok),
    }
}

pub fn is_boolean(tok: &str, ctx: &Context) -> bool {
    match ctx.lookup(tok) {
        Some(BoolValue(_)) => true,
        _ => is_bool_literal(tok),
    }
}

/// Decimal text such as `42`, `-0.5` or `1e3`, plus the `inf`, `-inf` and
/// `NaN` renderings of non-finite results.
pub fn parse_decimal(text: &str) -> Option<f64> {
    match text {
        "inf" => return Some(f64::INFINITY),
        "-inf" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => (),
    }

    let shaped = text.chars().any(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
    match shaped {
        true => text.parse().ok(),
        false => None,
    }
}

pub fn normalize_number(x: f64) -> String {
    if x.is_finite() && x.fract().abs() < SNAP_EPSILON {
        // `+ 0.0` folds a negative zero into `0`
        format!("{}", x.trunc() + 0.0)
    } else {
        format!("{}", x)
    }
}

fn looks_like_name(tok: &str) -> bool {
    tok.chars()
        .next()
        .map_or(false, |c| c.is_alphabetic() || c == '_')
}

fn unresolved(op: &str, tok: &str, expected: Type) -> RuntimeError {
    match looks_like_name(tok) && !matches!(tok, "true" | "false") {
        true => VariableNotFound(tok.to_owned()),
        false => TypeMismatch(op.to_owned(), expected, tok.to_owned()),
    }
}

pub fn as_number(op: &str, tok: &str, ctx: &mut Context) -> Result<f64, RuntimeError> {
    if is_parens(tok) {
        let text = ctx.eval(remove_parens(tok))?;
        return parse_decimal(&text).ok_or(TypeMismatch(op.to_owned(), Type::NumberType, text));
    }

    if is_number(tok, ctx) {
        return match ctx.lookup(tok) {
            Some(NumberValue(n)) => Ok(*n),
            _ => tok
                .parse()
                .map_err(|_| TypeMismatch(op.to_owned(), Type::NumberType, tok.to_owned())),
        };
    }

    match ctx.lookup(tok) {
        Some(other) => Err(VariableTypeMismatch(
            tok.to_owned(),
            Type::NumberType,
            other.get_type(),
        )),
        None => Err(unresolved(op, tok, Type::NumberType)),
    }
}

pub fn as_boolean(op: &str, tok: &str, ctx: &mut Context) -> Result<bool, RuntimeError> {
    if is_parens(tok) {
        let text = ctx.eval(remove_parens(tok))?;
        return literal_bool(&text).ok_or(TypeMismatch(op.to_owned(), Type::BoolType, text));
    }

    if is_boolean(tok, ctx) {
        return match ctx.lookup(tok) {
            Some(BoolValue(b)) => Ok(*b),
            _ => Ok(literal_bool(tok).unwrap_or(false)),
        };
    }

    match ctx.lookup(tok) {
        Some(other) => Err(VariableTypeMismatch(
            tok.to_owned(),
            Type::BoolType,
            other.get_type(),
        )),
        None => Err(unresolved(op, tok, Type::BoolType)),
    }
}

fn literal_bool(text: &str) -> Option<bool> {
    match text {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Type-agnostic resolution, used for call arguments and comparisons.
pub fn resolve_value(tok: &str, ctx: &mut Context) -> Result<Value, RuntimeError> {
    if is_parens(tok) {
        return ctx.eval(remove_parens(tok)).map(|text| Value::from_text(&text));
    }
    if is_string(tok) {
        return Ok(StringValue(string_payload(tok)));
    }

    match ctx.lookup(tok) {
        Some(value) => Ok(value.clone()),
        None if is_integer_literal(tok) => tok
            .parse()
            .map(NumberValue)
            .map_err(|_| VariableNotFound(tok.to_owned())),
        None if tok == "true" => Ok(BoolValue(true)),
        None if tok == "false" => Ok(BoolValue(false)),
        None => Err(VariableNotFound(tok.to_owned())),
    }
}

/// Textual resolution for `if` branches and `return` values.
pub fn as_string(tok: &str, ctx: &mut Context) -> Result<String, RuntimeError> {
    if is_string(tok) {
        return Ok(string_payload(tok));
    }
    if is_parens(tok) {
        return ctx.eval(remove_parens(tok));
    }

    match ctx.lookup(tok) {
        Some(value) => Ok(value.to_string()),
        None if parse_decimal(tok).is_some() || matches!(tok, "true" | "false") => {
            Ok(tok.to_owned())
        }
        None => Err(VariableNotFound(tok.to_owned())),
    }
}

pub fn str_to_num(op: &str, tok: &str, ctx: &mut Context) -> Result<f64, RuntimeError> {
    if is_parens(tok) {
        let text = ctx.eval(remove_parens(tok))?;
        return parse_decimal(&text).ok_or(TypeMismatch(op.to_owned(), Type::NumberType, text));
    }

    match (ctx.lookup(tok), parse_decimal(tok)) {
        (Some(NumberValue(n)), _) => Ok(*n),
        (_, Some(n)) => Ok(n),
        (Some(other), None) => Err(VariableTypeMismatch(
            tok.to_owned(),
            Type::NumberType,
            other.get_type(),
        )),
        (None, None) => Err(unresolved(op, tok, Type::NumberType)),
    }
}

/// Lenient: anything that is not a recognised truthy literal is `false`.
pub fn str_to_bool(tok: &str, ctx: &mut Context) -> Result<bool, RuntimeError> {
    let text = match is_parens(tok) {
        true => ctx.eval(remove_parens(tok))?,
        false => match ctx.lookup(tok) {
            Some(BoolValue(b)) => return Ok(*b),
            _ => remove_quotes(tok).to_owned(),
        },
    };

    match text.as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        other => {
            log::warn!("'{}' is not a boolean, treating it as false", other);
            Ok(false)
        }
    }
}

/// Like `as_string`, but a bare word naming no variable is its own text.
pub fn str_to_str(tok: &str, ctx: &mut Context) -> Result<String, RuntimeError> {
    match is_string(tok) || is_parens(tok) || ctx.lookup(tok).is_some() {
        true => as_string(tok, ctx),
        false => Ok(tok.to_owned()),
    }
}
