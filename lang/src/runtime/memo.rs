//! Result cache for `defmem` functions.
//!
//! Entries are keyed by the callable's name and its resolved argument tuple
//! and live for the whole run; nothing is ever evicted.

use crate::{
    runtime::Value::{self, BoolValue, NumberValue, StringValue},
    syntax::tree::Ident,
};
use ordered_float::OrderedFloat;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ArgKey {
    Number(OrderedFloat<f64>),
    Bool(bool),
    Str(String),
}

impl From<&Value> for ArgKey {
    fn from(v: &Value) -> Self {
        match v {
            NumberValue(n) => ArgKey::Number(OrderedFloat(*n)),
            BoolValue(b) => ArgKey::Bool(*b),
            StringValue(s) => ArgKey::Str(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    name: Ident,
    args: Vec<ArgKey>,
}

impl MemoKey {
    fn new(name: &str, args: &[Value]) -> Self {
        MemoKey {
            name: name.to_owned(),
            args: args.iter().map(ArgKey::from).collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<MemoKey, String>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str, args: &[Value]) -> Option<&String> {
        self.entries.get(&MemoKey::new(name, args))
    }

    pub fn insert(&mut self, name: &str, args: &[Value], result: String) {
        self.entries.insert(MemoKey::new(name, args), result);
    }

    /// Drops every entry of `name`, used when it is redefined.
    pub fn forget(&mut self, name: &str) {
        self.entries.retain(|key, _| key.name != name);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
