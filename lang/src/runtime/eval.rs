use std::{collections::HashMap, rc::Rc};

use crate::{
    runtime::{
        builtins::{self, Dispatch, RETURN_KEYWORD},
        coerce::{self, is_parens, is_string},
        console::{Console, StdConsole},
        memo::MemoCache,
        CallableKind, Context, Definition, RuntimeError,
        RuntimeError::{
            ArityMismatch, DepthExceeded, EndOfInput, MalformedStatement, NameConflict,
            StackUnderflow, UnknownOperation, VariableNotFound, VariableTypeMismatch,
        },
        Scope, Type, Value, DEFAULT_MAX_DEPTH,
    },
    syntax::{
        split::split,
        tree::{Ident, Program, Statement, Token},
    },
};

// Below this much remaining stack, nested evaluation moves to a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

pub(crate) trait Eval {
    fn eval_into(self, ctx: &mut Context) -> Result<String, RuntimeError>;
}

impl<T: Eval> Eval for Vec<T> {
    fn eval_into(self, ctx: &mut Context) -> Result<String, RuntimeError> {
        let mut value = String::new();
        for stmt in self {
            value = stmt.eval_into(ctx)?;
        }

        Ok(value)
    }
}

impl Eval for Statement {
    fn eval_into(self, ctx: &mut Context) -> Result<String, RuntimeError> {
        match self {
            Statement::Simple(text) => ctx.eval(text.as_str()),
            Statement::Block { header, body } => {
                ctx.define_block(header.as_str(), body)?;
                Ok(String::new())
            }
        }
    }
}

impl Context {
    pub fn new() -> Context {
        Context::with_console(Box::new(StdConsole::new()))
    }

    pub fn with_console(console: Box<dyn Console>) -> Context {
        Context {
            stack: vec![Scope::default()],
            functions: Default::default(),
            subroutines: Default::default(),
            memoized: Default::default(),
            memo: MemoCache::new(),
            listing: Vec::new(),
            console,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Runs a whole program. Its listing is recorded first so `printall`
    /// sees every line, including those after it.
    pub fn source(&mut self, input: Program) -> Result<String, RuntimeError> {
        self.record_listing(&input);
        input.eval_into(self)
    }

    /// Evaluates one statement and returns its textual result.
    pub fn eval(&mut self, statement: &str) -> Result<String, RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(DepthExceeded(self.max_depth));
        }

        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.dispatch(statement)
        });
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, statement: &str) -> Result<String, RuntimeError> {
        if statement.trim_start().starts_with("//") {
            return Ok(String::new());
        }

        let words = split(statement)?;
        let (head, args) = match words.split_first() {
            Some(parts) => parts,
            None => return Ok(String::new()),
        };

        log::trace!("eval: {}", statement);

        match self.classify(head)? {
            Dispatch::Declare(kind) => {
                self.define(kind, &words, Vec::new())?;
                Ok(String::new())
            }
            Dispatch::Builtin(builtin) => {
                builtin.arity().check(head, args.len())?;
                builtin.run(self, head, args)
            }
            Dispatch::Call(kind) => self.call(kind, head, args),
        }
    }

    /// Resolves a statement head: declarations, builtins, then user
    /// functions, subroutines and memoized functions.
    pub fn classify(&self, head: &str) -> Result<Dispatch, RuntimeError> {
        if let Some(kind) = builtins::declaration(head) {
            return Ok(Dispatch::Declare(kind));
        }
        if let Some(builtin) = builtins::keyword(head) {
            return Ok(Dispatch::Builtin(builtin));
        }

        [
            CallableKind::Function,
            CallableKind::Subroutine,
            CallableKind::Memoized,
        ]
        .iter()
        .find(|kind| self.registry(**kind).contains_key(head))
        .map(|kind| Dispatch::Call(*kind))
        .ok_or_else(|| UnknownOperation(head.to_owned()))
    }

    fn registry(&self, kind: CallableKind) -> &HashMap<Ident, Rc<Definition>> {
        match kind {
            CallableKind::Function => &self.functions,
            CallableKind::Subroutine => &self.subroutines,
            CallableKind::Memoized => &self.memoized,
        }
    }

    fn registry_mut(&mut self, kind: CallableKind) -> &mut HashMap<Ident, Rc<Definition>> {
        match kind {
            CallableKind::Function => &mut self.functions,
            CallableKind::Subroutine => &mut self.subroutines,
            CallableKind::Memoized => &mut self.memoized,
        }
    }

    /// Which kind of callable `name` is registered as, if any.
    pub fn callable_kind(&self, name: &str) -> Option<CallableKind> {
        [
            CallableKind::Function,
            CallableKind::Subroutine,
            CallableKind::Memoized,
        ]
        .iter()
        .copied()
        .find(|kind| self.registry(*kind).contains_key(name))
    }

    pub fn define_block(&mut self, header: &str, body: Vec<String>) -> Result<(), RuntimeError> {
        let words = split(header)?;
        match words.first().and_then(|head| builtins::declaration(head)) {
            Some(kind) => self.define(kind, &words, body),
            None => Err(MalformedStatement(
                header.to_owned(),
                "a block must start with define, subroutine or defmem".to_owned(),
            )),
        }
    }

    /// Registers a callable from its tokenized header
    /// (`define name p1 p2`) and its body lines.
    pub fn define(
        &mut self,
        kind: CallableKind,
        header: &[Token],
        body: Vec<String>,
    ) -> Result<(), RuntimeError> {
        let malformed = |reason: &str| MalformedStatement(header.join(" "), reason.to_owned());

        let name = match header.get(1) {
            Some(name) if is_string(name) || is_parens(name) => {
                return Err(malformed("callable name must be a plain word"))
            }
            Some(name) => name.clone(),
            None => return Err(malformed("missing callable name")),
        };
        let params = header[2..].to_vec();

        if kind == CallableKind::Subroutine && !params.is_empty() {
            return Err(malformed("subroutines take no parameters"));
        }
        if let Some(param) = params.iter().find(|p| is_string(p) || is_parens(p)) {
            return Err(malformed(&format!("'{}' is not a parameter name", param)));
        }
        if params
            .iter()
            .enumerate()
            .any(|(i, p)| params[..i].contains(p))
        {
            return Err(malformed("duplicate parameter name"));
        }

        if builtins::is_reserved(&name) {
            return Err(NameConflict(name, "builtin"));
        }
        match self.callable_kind(&name) {
            Some(existing) if existing != kind => {
                return Err(NameConflict(name, existing.describe()))
            }
            _ => (),
        }
        if self.global_scope().vars.contains_key(&name) {
            return Err(NameConflict(name, "variable"));
        }

        log::debug!(
            "define {} {}({}) with {} statement(s)",
            kind.describe(),
            name,
            params.join(", "),
            body.len()
        );

        if kind == CallableKind::Memoized {
            self.memo.forget(&name);
        }
        let definition = Definition {
            name: name.clone(),
            params,
            body,
        };
        self.registry_mut(kind).insert(name, Rc::new(definition));
        Ok(())
    }

    fn call(
        &mut self,
        kind: CallableKind,
        name: &str,
        args: &[Token],
    ) -> Result<String, RuntimeError> {
        let def = self
            .registry(kind)
            .get(name)
            .cloned()
            .ok_or_else(|| UnknownOperation(name.to_owned()))?;

        if args.len() != def.params.len() {
            return Err(ArityMismatch(
                name.to_owned(),
                format!("exactly {}", def.params.len()),
                args.len(),
            ));
        }

        match kind {
            CallableKind::Subroutine => {
                log::debug!("call subroutine {}", name);
                self.run_body(&def.body)?;
                Ok(String::new())
            }
            CallableKind::Function => {
                let values = self.resolve_args(args)?;
                self.invoke(&def, values)
            }
            CallableKind::Memoized => {
                let values = self.resolve_args(args)?;
                if let Some(hit) = self.memo.lookup(name, &values) {
                    log::trace!("memo hit: {} {:?}", name, values);
                    return Ok(hit.clone());
                }

                log::trace!("memo miss: {} {:?}", name, values);
                let result = self.invoke(&def, values.clone())?;
                self.memo.insert(name, &values, result.clone());
                Ok(result)
            }
        }
    }

    fn resolve_args(&mut self, args: &[Token]) -> Result<Vec<Value>, RuntimeError> {
        args.iter()
            .map(|tok| coerce::resolve_value(tok, self))
            .collect()
    }

    /// Runs a function body in a fresh frame holding only its parameters.
    fn invoke(&mut self, def: &Definition, args: Vec<Value>) -> Result<String, RuntimeError> {
        log::debug!("call {}({:?})", def.name, args);

        self.new_scope(&def.params, args);
        let result = match self.run_body(&def.body) {
            Ok(value) => value,
            err => {
                self.pop_scope()?;
                return err;
            }
        };
        self.pop_scope()?;
        Ok(result)
    }

    /// Runs body statements in order until the first `return`.
    fn run_body(&mut self, body: &[String]) -> Result<String, RuntimeError> {
        for line in body {
            let is_return = line
                .split_whitespace()
                .next()
                .map_or(false, |head| head.eq_ignore_ascii_case(RETURN_KEYWORD));

            if is_return {
                let words = split(line)?;
                return match words.get(1..).unwrap_or(&[]) {
                    [] => Ok(String::new()),
                    [value] => coerce::as_string(value, self),
                    rest => self.eval(rest.join(" ").as_str()),
                };
            }

            self.eval(line)?;
        }

        Ok(String::new())
    }

    fn new_scope(&mut self, params: &[Ident], args: Vec<Value>) {
        debug_assert_eq!(params.len(), args.len());
        let vars = params.iter().cloned().zip(args).collect();
        self.stack.push(Scope { vars })
    }

    fn pop_scope(&mut self) -> Result<(), RuntimeError> {
        match self.stack.len() {
            0 | 1 => Err(StackUnderflow),
            _ => self.stack.pop().map(|_| ()).ok_or(StackUnderflow),
        }
    }

    fn global_scope(&self) -> &Scope {
        &self.stack[0]
    }

    pub fn current_scope(&self) -> &Scope {
        &self.stack[self.stack.len() - 1]
    }

    pub fn frame_depth(&self) -> usize {
        self.stack.len()
    }

    /// The value bound to `name` in the current frame.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.stack.last().and_then(|scope| scope.vars.get(name))
    }

    pub fn get_var(&self, name: &str) -> Result<&Value, RuntimeError> {
        self.lookup(name)
            .ok_or_else(|| VariableNotFound(name.to_owned()))
    }

    fn get_typed(&self, name: &str, expected: Type) -> Result<&Value, RuntimeError> {
        let value = self.get_var(name)?;
        match value.get_type() == expected {
            true => Ok(value),
            false => Err(VariableTypeMismatch(
                name.to_owned(),
                expected,
                value.get_type(),
            )),
        }
    }

    pub fn get_number(&self, name: &str) -> Result<f64, RuntimeError> {
        match self.get_typed(name, Type::NumberType)? {
            Value::NumberValue(n) => Ok(*n),
            _ => unreachable!("checked by get_typed"),
        }
    }

    pub fn get_boolean(&self, name: &str) -> Result<bool, RuntimeError> {
        match self.get_typed(name, Type::BoolType)? {
            Value::BoolValue(b) => Ok(*b),
            _ => unreachable!("checked by get_typed"),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<&str, RuntimeError> {
        match self.get_typed(name, Type::StringType)? {
            Value::StringValue(s) => Ok(s.as_str()),
            _ => unreachable!("checked by get_typed"),
        }
    }

    /// Creates or overwrites a binding in the current frame.
    pub fn put_var(&mut self, name: Ident, value: Value) -> Result<Option<Value>, RuntimeError> {
        if builtins::is_reserved(&name) {
            return Err(NameConflict(name, "builtin"));
        }
        if let Some(kind) = self.callable_kind(&name) {
            return Err(NameConflict(name, kind.describe()));
        }

        Ok(self
            .stack
            .last_mut()
            .ok_or(StackUnderflow)?
            .vars
            .insert(name, value))
    }

    pub fn write(&mut self, text: &str) -> Result<(), RuntimeError> {
        self.console.write(text)
    }

    pub fn read_token(&mut self) -> Result<String, RuntimeError> {
        self.console.read_token()?.ok_or(EndOfInput)
    }

    /// Output captured by an in-memory console.
    pub fn output(&self) -> Option<&str> {
        self.console.captured()
    }

    pub fn listing(&self) -> &[String] {
        &self.listing
    }

    pub fn record_listing(&mut self, program: &[Statement]) {
        self.listing
            .extend(program.iter().flat_map(|stmt| stmt.listing()));
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}
