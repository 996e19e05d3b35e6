//! Text input and output used by the evaluator.

use crate::runtime::RuntimeError;
use std::{
    collections::VecDeque,
    fmt::Debug,
    io::{BufRead, Write},
};

pub trait Console: Debug {
    /// Appends text to the output; it must be visible once this returns.
    fn write(&mut self, text: &str) -> Result<(), RuntimeError>;

    /// Blocks until the next whitespace-delimited token is available.
    /// `None` means the input is exhausted.
    fn read_token(&mut self) -> Result<Option<String>, RuntimeError>;

    /// Everything written so far, for consoles that keep it.
    fn captured(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Default)]
pub struct StdConsole {
    pending: VecDeque<String>,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for StdConsole {
    fn write(&mut self, text: &str) -> Result<(), RuntimeError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn read_token(&mut self) -> Result<Option<String>, RuntimeError> {
        while self.pending.is_empty() {
            let mut line = String::new();
            if std::io::stdin().lock().read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending
                .extend(line.split_whitespace().map(|token| token.to_owned()));
        }
        Ok(self.pending.pop_front())
    }
}

/// In-memory console: scripted input, captured output.
#[derive(Debug, Default)]
pub struct BufferConsole {
    input: VecDeque<String>,
    output: String,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: &str) -> Self {
        BufferConsole {
            input: input.split_whitespace().map(|t| t.to_owned()).collect(),
            output: String::new(),
        }
    }
}

impl Console for BufferConsole {
    fn write(&mut self, text: &str) -> Result<(), RuntimeError> {
        self.output.push_str(text);
        Ok(())
    }

    fn read_token(&mut self) -> Result<Option<String>, RuntimeError> {
        Ok(self.input.pop_front())
    }

    fn captured(&self) -> Option<&str> {
        Some(self.output.as_str())
    }
}
