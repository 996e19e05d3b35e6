pub mod parse;
pub mod split;
pub mod tree;

pub use self::{
    parse::{CompileError, LineParser},
    split::{split, split_with, SyntaxError},
    tree::{Ident, Program, Statement, Token},
};
