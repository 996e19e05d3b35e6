use crate::{
    runtime::{Context, RuntimeError},
    syntax::parse::{CompileError, LineParser},
    syntax::tree::Program,
};

extern crate pest;
#[macro_use]
extern crate pest_derive;

pub mod runtime;
pub mod syntax;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

pub struct Compiler;

impl Compiler {
    pub fn compile(input: &str) -> Result<Program, CompileError> {
        LineParser::program(input)
    }
}

/// Compiles and runs `input` on `ctx`, returning the exit status the program
/// asked for (0 unless it called `quit`).
pub fn run(ctx: &mut Context, input: &str) -> Result<i32, Error> {
    let program = Compiler::compile(input)?;
    match ctx.source(program) {
        Ok(_) => Ok(0),
        Err(RuntimeError::Halt(code)) => Ok(code),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::console::BufferConsole;

    #[test]
    fn test_run_reports_exit_status() {
        let mut ctx = Context::with_console(Box::new(BufferConsole::new()));
        assert_eq!(run(&mut ctx, "println \"hi\"").unwrap(), 0);
        assert_eq!(run(&mut ctx, "quit 7\nprintln \"no\"").unwrap(), 7);
        assert_eq!(ctx.output(), Some("hi\n"));
    }

    #[test]
    fn test_run_separates_compile_and_runtime_errors() {
        let mut ctx = Context::with_console(Box::new(BufferConsole::new()));
        assert!(matches!(run(&mut ctx, "define f\nreturn 1"), Err(Error::Compile(_))));
        assert!(matches!(run(&mut ctx, "nope"), Err(Error::Runtime(_))));
    }
}
