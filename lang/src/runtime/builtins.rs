use crate::{
    runtime::{
        coerce::{self, is_parens, is_string},
        CallableKind, Context, RuntimeError,
        Value::{BoolValue, NumberValue, StringValue},
    },
    syntax::tree::Token,
};
use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Formatter};

macro_rules! map(
    { $($key:expr => $value:expr),+ } => {
        {
            let mut m = ::std::collections::HashMap::new();
            $(
                m.insert($key.to_string(), $value);
            )+
            m
        }
     };
);

lazy_static! {
    static ref DECLARATIONS: HashMap<String, CallableKind> = map! {
        "define" => CallableKind::Function,
        "subroutine" => CallableKind::Subroutine,
        "defmem" => CallableKind::Memoized
    };

    static ref BUILTINS: HashMap<String, Builtin> = map! {
        "quit" => Builtin::Quit,
        "print" => Builtin::Print,
        "println" => Builtin::Println,
        "string" => Builtin::DeclareString,
        "num" => Builtin::DeclareNum,
        "boolean" => Builtin::DeclareBoolean,
        "read" => Builtin::Read,
        "if" => Builtin::If,
        "printall" => Builtin::PrintAll,
        "add" => Builtin::Add,
        "sub" => Builtin::Sub,
        "mul" => Builtin::Mul,
        "div" => Builtin::Div,
        "and" => Builtin::And,
        "or" => Builtin::Or,
        "not" => Builtin::Not,
        "nand" => Builtin::Nand,
        "nor" => Builtin::Nor,
        "xor" => Builtin::Xor,
        "xnor" => Builtin::Xnor,
        "eq" => Builtin::Eq,
        "ne" => Builtin::Ne,
        "gt" => Builtin::Gt,
        "ge" => Builtin::Ge,
        "lt" => Builtin::Lt,
        "le" => Builtin::Le,
        "compare" => Builtin::Compare
    };
}

/// Ends a function body; only meaningful as the head of a body statement.
pub const RETURN_KEYWORD: &str = "return";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Quit,
    Print,
    Println,
    DeclareString,
    DeclareNum,
    DeclareBoolean,
    Read,
    If,
    PrintAll,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Not,
    Nand,
    Nor,
    Xor,
    Xnor,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Compare,
}

/// How the head of a statement is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Declare(CallableKind),
    Builtin(Builtin),
    Call(CallableKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::AtMost(n) => write!(f, "at most {}", n),
        }
    }
}

impl Arity {
    pub fn check(self, op: &str, got: usize) -> Result<(), RuntimeError> {
        let ok = match self {
            Arity::Exactly(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::AtMost(n) => got <= n,
        };
        match ok {
            true => Ok(()),
            false => Err(RuntimeError::ArityMismatch(
                op.to_owned(),
                self.to_string(),
                got,
            )),
        }
    }
}

pub fn declaration(head: &str) -> Option<CallableKind> {
    DECLARATIONS.get(head).copied()
}

pub fn keyword(head: &str) -> Option<Builtin> {
    BUILTINS.get(head).copied()
}

/// Names user code may not take for a callable or variable.
pub fn is_reserved(name: &str) -> bool {
    name == RETURN_KEYWORD || declaration(name).is_some() || keyword(name).is_some()
}

pub fn keywords() -> impl Iterator<Item = &'static String> {
    DECLARATIONS.keys().chain(BUILTINS.keys())
}

impl Builtin {
    pub fn arity(self) -> Arity {
        match self {
            Builtin::Quit | Builtin::Read => Arity::AtMost(1),
            Builtin::Print | Builtin::Println | Builtin::PrintAll => Arity::AtLeast(0),
            Builtin::DeclareString | Builtin::DeclareNum | Builtin::DeclareBoolean => {
                Arity::Exactly(2)
            }
            Builtin::If => Arity::Exactly(3),
            Builtin::Add | Builtin::Sub | Builtin::Mul | Builtin::Div => Arity::AtLeast(2),
            Builtin::And | Builtin::Or | Builtin::Nand | Builtin::Nor => Arity::AtLeast(2),
            Builtin::Not => Arity::Exactly(1),
            Builtin::Xor | Builtin::Xnor => Arity::Exactly(2),
            Builtin::Eq
            | Builtin::Ne
            | Builtin::Gt
            | Builtin::Ge
            | Builtin::Lt
            | Builtin::Le
            | Builtin::Compare => Arity::Exactly(2),
        }
    }

    /// Runs the builtin on already arity-checked operands.
    pub fn run(self, ctx: &mut Context, op: &str, args: &[Token]) -> Result<String, RuntimeError> {
        match self {
            Builtin::Quit => quit(ctx, op, args),
            Builtin::Print => print(ctx, args, false),
            Builtin::Println => print(ctx, args, true),
            Builtin::DeclareString
            | Builtin::DeclareNum
            | Builtin::DeclareBoolean => declare(ctx, self, op, args),
            Builtin::Read => read(ctx, op, args),
            Builtin::If => if_expr(ctx, op, args),
            Builtin::PrintAll => print_all(ctx),
            _ => crate::runtime::ops::apply(ctx, self, op, args).map(|v| v.to_string()),
        }
    }
}

fn quit(ctx: &mut Context, op: &str, args: &[Token]) -> Result<String, RuntimeError> {
    let code = match args.first() {
        Some(tok) => coerce::as_number(op, tok, ctx)? as i32,
        None => 0,
    };
    Err(RuntimeError::Halt(code))
}

fn print(ctx: &mut Context, args: &[Token], newline: bool) -> Result<String, RuntimeError> {
    for tok in args {
        let text = if is_string(tok) {
            coerce::string_payload(tok)
        } else if is_parens(tok) {
            ctx.eval(coerce::remove_parens(tok))?
        } else if tok == "~" {
            "\n".to_owned()
        } else {
            ctx.get_var(tok)?.to_string()
        };
        ctx.write(&text)?;
    }

    if newline {
        ctx.write("\n")?;
    }
    Ok(String::new())
}

fn declare(
    ctx: &mut Context,
    ty: Builtin,
    op: &str,
    args: &[Token],
) -> Result<String, RuntimeError> {
    let (name, value) = (&args[0], &args[1]);
    check_variable_name(op, name)?;

    let value = match ty {
        Builtin::DeclareNum => NumberValue(coerce::str_to_num(op, value, ctx)?),
        Builtin::DeclareBoolean => BoolValue(coerce::str_to_bool(value, ctx)?),
        _ => StringValue(coerce::str_to_str(value, ctx)?),
    };

    ctx.put_var(name.clone(), value)?;
    Ok(String::new())
}

fn read(ctx: &mut Context, op: &str, args: &[Token]) -> Result<String, RuntimeError> {
    if let Some(name) = args.first() {
        check_variable_name(op, name)?;
    }

    let token = ctx.read_token()?;
    if let Some(name) = args.first() {
        ctx.put_var(name.clone(), StringValue(token.clone()))?;
    }
    Ok(token)
}

fn check_variable_name(op: &str, name: &str) -> Result<(), RuntimeError> {
    match is_string(name) || is_parens(name) || coerce::parse_decimal(name).is_some() {
        true => Err(RuntimeError::MalformedStatement(
            op.to_owned(),
            format!("'{}' is not a variable name", name),
        )),
        false => Ok(()),
    }
}

fn if_expr(ctx: &mut Context, op: &str, args: &[Token]) -> Result<String, RuntimeError> {
    let branch = match coerce::as_boolean(op, &args[0], ctx)? {
        true => &args[1],
        false => &args[2],
    };
    coerce::as_string(branch, ctx)
}

fn print_all(ctx: &mut Context) -> Result<String, RuntimeError> {
    let listing = ctx.listing().join("\n");
    if !listing.is_empty() {
        ctx.write(&listing)?;
        ctx.write("\n")?;
    }
    Ok(String::new())
}
