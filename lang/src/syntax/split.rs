//! Statement tokenizer.
//!
//! A statement is split on the delimiter only at the top level: text inside a
//! quoted string or a parenthesized subexpression is one token and is kept
//! byte-for-byte, everything else is lower-cased.

use crate::syntax::tree::Token;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum SyntaxError {
    #[error("SyntaxError: unterminated string in '{0}'")]
    UnterminatedString(String),

    #[error("SyntaxError: unclosed '(' in '{0}'")]
    UnclosedParen(String),

    #[error("SyntaxError: unexpected ')' in '{0}'")]
    UnexpectedCloseParen(String),
}

pub fn split(statement: &str) -> Result<Vec<Token>, SyntaxError> {
    split_with(statement, ' ')
}

pub fn split_with(statement: &str, delim: char) -> Result<Vec<Token>, SyntaxError> {
    let is_delim = |c: char| c == delim || (delim == ' ' && c == '\t');

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;

    for c in statement.chars() {
        if in_string {
            current.push(c);
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => (),
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' if depth == 0 => {
                return Err(SyntaxError::UnexpectedCloseParen(statement.to_owned()));
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            c if depth == 0 && is_delim(c) => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if depth > 0 => current.push(c),
            c => current.extend(c.to_lowercase()),
        }
    }

    if in_string {
        return Err(SyntaxError::UnterminatedString(statement.to_owned()));
    }
    if depth > 0 {
        return Err(SyntaxError::UnclosedParen(statement.to_owned()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}
