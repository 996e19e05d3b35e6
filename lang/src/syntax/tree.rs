pub type Ident = String;

/// One whitespace- or structure-delimited piece of a statement.
/// Tokens carry no type; operators classify them on use.
pub type Token = String;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Statement {
    Simple(String),
    /// A `define`/`subroutine`/`defmem` declaration: the header line and
    /// every line up to (not including) the closing `end`.
    Block { header: String, body: Vec<String> },
}

pub type Program = Vec<Statement>;

impl Statement {
    pub fn simple(text: &str) -> Statement {
        Statement::Simple(text.to_owned())
    }

    pub fn block(header: &str, body: &[&str]) -> Statement {
        Statement::Block {
            header: header.to_owned(),
            body: body.iter().map(|line| (*line).to_owned()).collect(),
        }
    }

    /// Source lines of this statement, with blocks closed by `end`.
    pub fn listing(&self) -> Vec<String> {
        match self {
            Statement::Simple(text) => vec![text.clone()],
            Statement::Block { header, body } => {
                let mut lines = Vec::with_capacity(body.len() + 2);
                lines.push(header.clone());
                lines.extend(body.iter().cloned());
                lines.push("end".to_owned());
                lines
            }
        }
    }
}
