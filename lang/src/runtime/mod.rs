use crate::{
    runtime::{
        console::Console,
        memo::MemoCache,
        Value::{BoolValue, NumberValue, StringValue},
    },
    syntax::{tree::Ident, SyntaxError},
};
use std::{cmp::Ordering, collections::HashMap, fmt::Formatter, rc::Rc};

pub mod builtins;
pub mod coerce;
pub mod console;
pub mod eval;
pub mod memo;
pub mod ops;


pub const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(thiserror::Error, Debug)]
pub enum RuntimeError {
    #[error("NameError: operation '{0}' does not exist")]
    UnknownOperation(String),

    #[error("ArityError: '{0}' expects {1} operand(s), but got {2}")]
    ArityMismatch(String, String, usize),

    #[error("TypeError: '{0}' expected a {1}, but got '{2}'")]
    TypeMismatch(String, Type, String),

    #[error("TypeError: '{0}' cannot compare {1} with {2}")]
    IncomparableTypes(String, Type, Type),

    #[error("NameError: variable '{0}' not found")]
    VariableNotFound(String),

    #[error("TypeError: variable '{0}' is a {2}, not a {1}")]
    VariableTypeMismatch(String, Type, Type),

    #[error("NameError: '{0}' is already defined as a {1}")]
    NameConflict(String, &'static str),

    #[error("SyntaxError: malformed '{0}': {1}")]
    MalformedStatement(String, String),

    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("RuntimeError: maximum evaluation depth {0} exceeded")]
    DepthExceeded(usize),

    #[error("RuntimeError: stack underflow")]
    StackUnderflow,

    #[error("IOError: no input left to read")]
    EndOfInput,

    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),

    /// Raised by `quit`. Not a failure: the host decides how to exit.
    #[error("program exited with status {0}")]
    Halt(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    NumberType,
    BoolType,
    StringType,
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::NumberType => write!(f, "number"),
            Type::BoolType => write!(f, "boolean"),
            Type::StringType => write!(f, "string"),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    NumberValue(f64),
    BoolValue(bool),
    StringValue(String),
}

impl Value {
    pub fn get_type(&self) -> Type {
        match self {
            NumberValue(_) => Type::NumberType,
            BoolValue(_) => Type::BoolType,
            StringValue(_) => Type::StringType,
        }
    }

    /// Re-reads an evaluation result. Results are always text, so the type
    /// is recovered from its shape: numbers first, then `true`/`false`.
    pub fn from_text(text: &str) -> Value {
        match (coerce::parse_decimal(text), text) {
            (Some(n), _) => NumberValue(n),
            (None, "true") => BoolValue(true),
            (None, "false") => BoolValue(false),
            _ => StringValue(text.to_owned()),
        }
    }
}

/// Renders a value the way statements return it.
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberValue(v) => write!(f, "{}", coerce::normalize_number(*v)),
            BoolValue(v) => write!(f, "{}", v),
            StringValue(v) => write!(f, "{}", v),
        }
    }
}

impl std::cmp::PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (NumberValue(lhs), NumberValue(rhs)) => lhs.partial_cmp(rhs),
            (BoolValue(lhs), BoolValue(rhs)) => lhs.partial_cmp(rhs),
            (StringValue(lhs), StringValue(rhs)) => lhs.partial_cmp(rhs),
            _ => None,
        }
    }
}

impl std::cmp::PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumberValue(lhs), NumberValue(rhs)) => lhs == rhs,
            (BoolValue(lhs), BoolValue(rhs)) => lhs == rhs,
            (StringValue(lhs), StringValue(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    Subroutine,
    Memoized,
}

impl CallableKind {
    pub fn describe(&self) -> &'static str {
        match self {
            CallableKind::Function => "function",
            CallableKind::Subroutine => "subroutine",
            CallableKind::Memoized => "memoized function",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Vec<String>,
}

#[derive(Debug)]
pub struct Context {
    pub stack: Vec<Scope>,
    pub functions: HashMap<Ident, Rc<Definition>>,
    pub subroutines: HashMap<Ident, Rc<Definition>>,
    pub memoized: HashMap<Ident, Rc<Definition>>,
    pub memo: MemoCache,
    listing: Vec<String>,
    console: Box<dyn Console>,
    depth: usize,
    max_depth: usize,
}

#[derive(Debug, Default)]
pub struct Scope {
    pub vars: HashMap<Ident, Value>,
}
