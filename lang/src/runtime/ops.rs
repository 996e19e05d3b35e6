//! Arithmetic, logic and comparison operators.

use crate::{
    runtime::{
        builtins::Builtin,
        coerce::{as_boolean, as_number, is_parens, remove_parens, resolve_value},
        Context, RuntimeError,
        Value::{self, BoolValue, NumberValue, StringValue},
    },
    syntax::tree::Token,
};
use std::cmp::Ordering;

pub fn apply(
    ctx: &mut Context,
    builtin: Builtin,
    op: &str,
    args: &[Token],
) -> Result<Value, RuntimeError> {
    match builtin {
        Builtin::Add | Builtin::Sub | Builtin::Mul | Builtin::Div => {
            arithmetic(ctx, builtin, op, args).map(NumberValue)
        }
        Builtin::And
        | Builtin::Or
        | Builtin::Not
        | Builtin::Nand
        | Builtin::Nor
        | Builtin::Xor
        | Builtin::Xnor => logic(ctx, builtin, op, args).map(BoolValue),
        Builtin::Compare => compare(ctx, op, args).map(|ord| {
            NumberValue(match ord {
                Some(Ordering::Less) => -1.0,
                Some(Ordering::Equal) => 0.0,
                Some(Ordering::Greater) => 1.0,
                None => f64::NAN,
            })
        }),
        Builtin::Eq | Builtin::Ne | Builtin::Gt | Builtin::Ge | Builtin::Lt | Builtin::Le => {
            let ord = compare(ctx, op, args)?;
            Ok(BoolValue(match builtin {
                Builtin::Eq => ord == Some(Ordering::Equal),
                Builtin::Ne => ord != Some(Ordering::Equal),
                Builtin::Gt => ord == Some(Ordering::Greater),
                Builtin::Ge => matches!(ord, Some(Ordering::Greater) | Some(Ordering::Equal)),
                Builtin::Lt => ord == Some(Ordering::Less),
                _ => matches!(ord, Some(Ordering::Less) | Some(Ordering::Equal)),
            }))
        }
        _ => unreachable!("{:?} is not an operator", builtin),
    }
}

fn arithmetic(
    ctx: &mut Context,
    builtin: Builtin,
    op: &str,
    args: &[Token],
) -> Result<f64, RuntimeError> {
    let operands = args
        .iter()
        .map(|tok| as_number(op, tok, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    // arity is checked by the caller, so there is always a first operand
    let (first, rest) = match operands.split_first() {
        Some((first, rest)) => (*first, rest),
        None => return Ok(0.0),
    };

    Ok(match builtin {
        Builtin::Add => operands.iter().fold(0.0, |acc, x| acc + x),
        Builtin::Mul => operands.iter().fold(1.0, |acc, x| acc * x),
        Builtin::Sub => rest.iter().fold(first, |acc, x| acc - x),
        _ => rest.iter().fold(first, |acc, x| acc / x),
    })
}

fn logic(
    ctx: &mut Context,
    builtin: Builtin,
    op: &str,
    args: &[Token],
) -> Result<bool, RuntimeError> {
    let operands = args
        .iter()
        .map(|tok| as_boolean(op, tok, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    let all = operands.iter().all(|b| *b);
    let any = operands.iter().any(|b| *b);
    let odd = operands.iter().filter(|b| **b).count() % 2 == 1;

    Ok(match builtin {
        Builtin::And => all,
        Builtin::Or => any,
        Builtin::Not => !all,
        Builtin::Nand => !all,
        Builtin::Nor => !any,
        Builtin::Xor => odd,
        _ => !odd,
    })
}

/// Orders two operands of the same type; mixing types is an error.
fn compare(ctx: &mut Context, op: &str, args: &[Token]) -> Result<Option<Ordering>, RuntimeError> {
    let (lhs, lhs_text) = comparand(ctx, &args[0])?;
    let (rhs, rhs_text) = comparand(ctx, &args[1])?;

    // a subexpression result is plain text, so it may be read as a string
    // when the other side is one
    let is_string = |value: &Value| matches!(value, StringValue(_));
    let (lhs, rhs) = match (lhs_text, rhs_text) {
        (Some(text), _) if is_string(&rhs) => (StringValue(text), rhs),
        (_, Some(text)) if is_string(&lhs) => (lhs, StringValue(text)),
        _ => (lhs, rhs),
    };

    match lhs.get_type() == rhs.get_type() {
        true => Ok(lhs.partial_cmp(&rhs)),
        false => Err(RuntimeError::IncomparableTypes(
            op.to_owned(),
            lhs.get_type(),
            rhs.get_type(),
        )),
    }
}

/// Resolves one comparison operand, keeping the raw text of a subexpression.
fn comparand(ctx: &mut Context, tok: &str) -> Result<(Value, Option<String>), RuntimeError> {
    match is_parens(tok) {
        true => {
            let text = ctx.eval(remove_parens(tok))?;
            Ok((Value::from_text(&text), Some(text)))
        }
        false => resolve_value(tok, ctx).map(|value| (value, None)),
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{console::BufferConsole, Context, RuntimeError};

    fn eval(src: &str) -> Result<String, RuntimeError> {
        Context::with_console(Box::new(BufferConsole::new())).eval(src)
    }

    fn ok(src: &str) -> String {
        eval(src).unwrap()
    }

    #[test]
    fn test_arithmetic_identities() {
        assert_eq!(ok("add 2 3"), "5");
        assert_eq!(ok("sub 10 4 1"), "5");
        assert_eq!(ok("mul 2 3 4"), "24");
        assert_eq!(ok("div 100 5 2"), "10");
    }

    #[test]
    fn test_fractional_results_are_not_truncated() {
        assert_eq!(ok("div 9 2"), "4.5");
        assert_eq!(ok("div 8 2"), "4");
        assert_eq!(ok("add (div 1 2) (div 1 4)"), "0.75");
        assert_eq!(ok("mul (div 1 2) 3"), "1.5");
        assert_eq!(ok("sub 1 3"), "-2");
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(ok("div 1 0"), "inf");
        assert_eq!(ok("div -1 0"), "-inf");
        assert_eq!(ok("add (div 1 0) 1"), "inf");
        assert_eq!(ok("mul (div -1 0) 2"), "-inf");
        assert_eq!(ok("sub (div 1 0) (div 1 0)"), "NaN");
    }

    #[test]
    fn test_arithmetic_arity_and_types() {
        assert!(matches!(eval("add 1"), Err(RuntimeError::ArityMismatch(..))));
        assert!(matches!(eval("mul \"a\" 2"), Err(RuntimeError::TypeMismatch(..))));
        assert!(matches!(eval("add 1.5 2"), Err(RuntimeError::TypeMismatch(..))));
        assert!(matches!(eval("add x 2"), Err(RuntimeError::VariableNotFound(_))));
        assert!(matches!(eval("add (eq 1 1) 2"), Err(RuntimeError::TypeMismatch(..))));
    }

    #[test]
    fn test_boolean_algebra() {
        assert_eq!(ok("and true true"), "true");
        assert_eq!(ok("and true false true"), "false");
        assert_eq!(ok("or false false 1"), "true");
        assert_eq!(ok("nand true true"), "false");
        assert_eq!(ok("nor false false"), "true");
        assert_eq!(ok("not 0"), "true");
        assert_eq!(ok("xor true false"), "true");
        assert_eq!(ok("xor true true"), "false");
        assert_eq!(ok("xnor true true"), "true");
        assert_eq!(ok("xnor false true"), "false");
        assert_eq!(ok("and (gt 3 1) (lt 1 3)"), "true");
    }

    #[test]
    fn test_logic_arity() {
        assert!(matches!(eval("not true false"), Err(RuntimeError::ArityMismatch(..))));
        assert!(matches!(eval("xor true false true"), Err(RuntimeError::ArityMismatch(..))));
        assert!(matches!(eval("and true"), Err(RuntimeError::ArityMismatch(..))));
        assert!(matches!(eval("and true 2"), Err(RuntimeError::TypeMismatch(..))));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(ok("eq 3 3"), "true");
        assert_eq!(ok("ne 3 3"), "false");
        assert_eq!(ok("gt 5 2"), "true");
        assert_eq!(ok("ge 2 2"), "true");
        assert_eq!(ok("lt 5 2"), "false");
        assert_eq!(ok("le -1 0"), "true");
        assert_eq!(ok("eq \"a\" \"b\""), "false");
        assert_eq!(ok("lt \"a\" \"b\""), "true");
        assert_eq!(ok("eq true true"), "true");
        assert_eq!(ok("gt true false"), "true");
        assert_eq!(ok("eq (add 1 2) 3"), "true");
    }

    #[test]
    fn test_subexpression_text_compares_as_string() {
        assert_eq!(ok("eq (if true \"12\" \"x\") \"12\""), "true");
        assert_eq!(ok("eq \"12\" (if true \"12\" \"x\")"), "true");
        assert_eq!(ok("eq (if true \"12\" \"x\") 12"), "true");
        assert_eq!(ok("lt (add 1 1) \"3\""), "true");
        assert!(matches!(
            eval("eq (eq 1 1) 1"),
            Err(RuntimeError::IncomparableTypes(..))
        ));
    }

    #[test]
    fn test_three_way_compare() {
        assert_eq!(ok("compare 1 2"), "-1");
        assert_eq!(ok("compare 2 2"), "0");
        assert_eq!(ok("compare \"b\" \"a\""), "1");
    }

    #[test]
    fn test_comparison_across_types_fails() {
        assert!(matches!(
            eval("eq 1 true"),
            Err(RuntimeError::IncomparableTypes(..))
        ));
        assert!(matches!(
            eval("compare \"1\" 1"),
            Err(RuntimeError::IncomparableTypes(..))
        ));
        assert!(matches!(eval("eq 1"), Err(RuntimeError::ArityMismatch(..))));
    }
}
