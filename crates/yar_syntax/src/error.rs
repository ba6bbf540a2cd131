//! Parse errors.
//!
//! The parser never aborts: each error is recorded with its source line and
//! the parser skips ahead to a synchronization token (newline, semicolon,
//! closing brace) before continuing. A parse therefore yields both a best-
//! effort AST and a list of everything that went wrong.

use std::fmt;
use yar_base::Span;

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    /// Found something other than what the grammar required.
    UnexpectedToken { expected: String, found: String },
    /// A delimiter such as `)` or `}` never appeared.
    MissingDelimiter { delimiter: String },
    /// `:=` with a non-identifier on the left.
    ShortDeclTarget,
    /// `defer` wrapping something that is not a call.
    DeferRequiresCall,
    /// A byte that starts no token.
    IllegalToken { text: String },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ParseErrorKind::MissingDelimiter { delimiter } => {
                write!(f, "missing '{}'", delimiter)
            }
            ParseErrorKind::ShortDeclTarget => {
                write!(f, "short declaration target must be an identifier")
            }
            ParseErrorKind::DeferRequiresCall => {
                write!(f, "defer requires a call expression")
            }
            ParseErrorKind::IllegalToken { text } => {
                write!(f, "illegal token '{}'", text)
            }
        }
    }
}

/// A recorded parse error: what went wrong and where.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn line(&self) -> u32 {
        self.span.start.line
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line(), self.kind)
    }
}

impl std::error::Error for ParseError {}
