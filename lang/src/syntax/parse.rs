use std::result::Result;

use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser,
};

use crate::syntax::tree::{Program, Statement};

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
pub struct LineParser;

pub type ParseErrorVariant = ErrorVariant<Rule>;
pub type ParseError = Error<Rule>;

#[derive(Debug)]
pub struct CompileError(pub ParseError);

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CompileError {}

impl LineParser {
    /// Groups source text into statement records.
    pub fn program(input: &str) -> Result<Program, CompileError> {
        let pairs = LineParser::parse(Rule::program, input).map_err(CompileError)?;
        parse_unit(pairs)
    }
}

fn parse_unit(pairs: Pairs<Rule>) -> Result<Program, CompileError> {
    pairs
        .into_iter()
        .flat_map(|item| item.into_inner())
        .filter_map(|node| match node.as_rule() {
            Rule::block => Some(Ok(parse_block(node))),
            Rule::open_block => Some(Err(unterminated_block(node))),
            Rule::simple => parse_simple(node).map(Ok),
            Rule::EOI => None,
            _ => unreachable!("rule should be block or simple"),
        })
        .collect()
}

fn parse_simple(node: Pair<Rule>) -> Option<Statement> {
    match node.as_str().trim() {
        "" => None,
        text => Some(Statement::Simple(text.to_owned())),
    }
}

fn parse_block(node: Pair<Rule>) -> Statement {
    let mut header = String::new();
    let mut body = Vec::new();

    for child in node.into_inner() {
        match child.as_rule() {
            Rule::header => header = child.as_str().trim().to_owned(),
            Rule::body => body = parse_body(child),
            _ => unreachable!("block should only contain header and body"),
        }
    }

    Statement::Block { header, body }
}

fn parse_body(node: Pair<Rule>) -> Vec<String> {
    node.into_inner()
        .map(|line| line.as_str().trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_owned())
        .collect()
}

fn unterminated_block(node: Pair<Rule>) -> CompileError {
    let header = node.as_str().trim();
    CompileError(Error::new_from_span(
        ParseErrorVariant::CustomError {
            message: format!("block '{}' is missing its closing 'end'", header),
        },
        node.as_span(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_lines() {
        let program = LineParser::program("num x 1\n\n   print x\n").unwrap();
        assert_eq!(
            program,
            vec![Statement::simple("num x 1"), Statement::simple("print x")]
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        let program = LineParser::program("println \"a\"\r\nprintln \"b\"").unwrap();
        assert_eq!(
            program,
            vec![
                Statement::simple("println \"a\""),
                Statement::simple("println \"b\"")
            ]
        );
    }

    #[test]
    fn test_blocks_are_grouped() {
        let src = "define twice n\n  return (mul n 2)\nend\nSubroutine hello\n\n  println \"hi\"\n  END  \nprint (twice 4)\n";
        let program = LineParser::program(src).unwrap();
        assert_eq!(
            program,
            vec![
                Statement::block("define twice n", &["return (mul n 2)"]),
                Statement::block("Subroutine hello", &["println \"hi\""]),
                Statement::simple("print (twice 4)"),
            ]
        );
    }

    #[test]
    fn test_block_at_end_of_input() {
        let program = LineParser::program("defmem sq x\nreturn (mul x x)\nend").unwrap();
        assert_eq!(program, vec![Statement::block("defmem sq x", &["return (mul x x)"])]);
    }

    #[test]
    fn test_keyword_prefix_is_not_a_block() {
        let program = LineParser::program("defines x\nendless\n").unwrap();
        assert_eq!(
            program,
            vec![Statement::simple("defines x"), Statement::simple("endless")]
        );
    }

    #[test]
    fn test_unterminated_block() {
        let err = LineParser::program("define f a\nreturn a\n").unwrap_err();
        assert!(format!("{}", err).contains("missing its closing 'end'"));
    }
}
