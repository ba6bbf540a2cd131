//! # yar-syntax
//!
//! Lexer, AST, and parser for the yar language.
//!
//! The crate covers everything from source text to a parsed module:
//!
//! ```text
//! source text ──▶ Lexer ──▶ tokens ──▶ Parser ──▶ ast::Module
//! ```
//!
//! - [`token`]: token kinds, the keyword table, and the [`Token`] type
//! - [`lexer`]: byte-driven scanner producing position-carrying tokens
//! - [`ast`]: closed sum types for types, expressions, statements, and
//!   declarations, plus a printer back to surface syntax
//! - [`parser`]: recursive descent with a Pratt expression climb and
//!   error recovery
//!
//! Parsing never panics and never stops at the first problem: the parser
//! accumulates [`ParseError`]s and resynchronizes, so a single run reports
//! as much as possible.
//!
//! ## Example
//!
//! ```
//! use yar_base::Interner;
//! use yar_syntax::Parser;
//!
//! let mut interner = Interner::new();
//! let mut parser = Parser::new("fn main() { println(\"hi\") }", &mut interner);
//! let module = parser.parse_module();
//!
//! assert!(parser.errors.is_empty());
//! assert_eq!(module.decls.len(), 1);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{lookup_keyword, Token, TokenKind};

// Re-exported so downstream crates name one source of truth for these.
pub use yar_base::{Interner, Pos, Span, Symbol};
