//! Recursive-descent parser with a Pratt expression climb.
//!
//! The parser operates on a `(current, peek)` pair of tokens and advances one
//! token at a time; there is no arbitrary lookahead. Comments are filtered at
//! the pump; newlines survive because the statement layer treats them as
//! terminators.
//!
//! Parse functions follow one convention throughout: on entry `current` is
//! the first token of the construct, on exit `current` is its last token.
//! Callers advance past it.
//!
//! Errors are accumulated with their source line; after an error the parser
//! skips to the next plausible synchronization token and continues, so a
//! single run reports as many problems as possible.
//!
//! The submodules split the grammar the same way the AST splits:
//!
//! - [`expr`]: Pratt precedence climb, prefix/postfix forms
//! - [`stmt`]: statement dispatch, `for` disambiguation, blocks
//! - [`decl`]: functions, structs, enums, traits, impls, uses
//! - [`types`]: surface type expressions

mod decl;
mod expr;
mod stmt;
mod types;

use crate::ast::{Decl, Module};
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use yar_base::{Interner, Span, Symbol};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub(crate) interner: &'a mut Interner,
    pub(crate) current: Token,
    pub(crate) peek: Token,
    pub errors: Vec<ParseError>,
    /// Cleared while parsing `if`/`while`/`for` headers so `ident {` reads
    /// as a condition followed by a block, not a struct literal.
    pub(crate) allow_struct_lit: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, interner: &'a mut Interner) -> Self {
        let mut lexer = Lexer::new(source);
        let current = Self::pump(&mut lexer);
        let peek = Self::pump(&mut lexer);
        Self {
            lexer,
            interner,
            current,
            peek,
            errors: Vec::new(),
            allow_struct_lit: true,
        }
    }

    fn pump(lexer: &mut Lexer<'a>) -> Token {
        loop {
            let tok = lexer.next_token();
            if tok.kind != TokenKind::Comment {
                return tok;
            }
        }
    }

    pub(crate) fn advance(&mut self) {
        let next = Self::pump(&mut self.lexer);
        self.current = std::mem::replace(&mut self.peek, next);
    }

    pub(crate) fn cur_is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    /// Advances if the peek token has the wanted kind; records an error and
    /// stays put otherwise.
    pub(crate) fn expect_peek(&mut self, kind: TokenKind, expected: &str) -> bool {
        if self.peek_is(kind) {
            self.advance();
            true
        } else {
            self.unexpected_peek(expected);
            false
        }
    }

    pub(crate) fn unexpected_peek(&mut self, expected: &str) {
        let found = describe_token(&self.peek);
        let span = self.peek.span;
        self.error(
            ParseErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found,
            },
            span,
        );
    }

    pub(crate) fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    /// Skips to the next statement boundary after an error.
    pub(crate) fn synchronize(&mut self) {
        while !self.current.kind.is_terminator() {
            self.advance();
        }
    }

    /// Consumes newline tokens sitting in the peek slot. Used inside
    /// bracketed constructs where line breaks are insignificant.
    pub(crate) fn skip_peek_newlines(&mut self) {
        while self.peek_is(TokenKind::Newline) {
            self.advance();
        }
    }

    pub(crate) fn intern_current(&mut self) -> Symbol {
        let text = self.current.lexeme.clone();
        self.interner.intern(&text)
    }

    /// Parses a whole source file into a module.
    pub fn parse_module(&mut self) -> Module {
        let start = self.current.span;
        let mut name = None;

        // Optional `module name` header.
        self.skip_terminators();
        if self.cur_is(TokenKind::Module) {
            if self.expect_peek(TokenKind::Ident, "module name") {
                name = Some(self.intern_current());
            }
            self.advance();
            self.skip_terminators();
        }

        let mut decls: Vec<Decl> = Vec::new();
        while !self.cur_is(TokenKind::Eof) {
            match self.parse_decl() {
                Some(decl) => {
                    decls.push(decl);
                    self.advance();
                }
                None => {
                    self.synchronize();
                }
            }
            self.skip_terminators();
        }

        let span = start.merge(self.current.span);
        Module { name, decls, span }
    }

    fn skip_terminators(&mut self) {
        while matches!(
            self.current.kind,
            TokenKind::Newline | TokenKind::Semicolon
        ) {
            self.advance();
        }
    }
}

/// Human-readable token description for error messages.
pub(crate) fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of file".to_string(),
        TokenKind::Newline => "end of line".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Printer;

    fn parse(source: &str) -> (Module, Vec<ParseError>, Interner) {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner);
        let module = parser.parse_module();
        let errors = parser.errors.clone();
        drop(parser);
        (module, errors, interner)
    }

    #[test]
    fn module_header_is_parsed() {
        let (module, errors, interner) = parse("module math\n\nfn main() { }\n");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(interner.resolve(module.name.unwrap()), "math");
        assert_eq!(module.decls.len(), 1);
    }

    #[test]
    fn errors_do_not_abort_parsing() {
        let source = "fn main() { let = 5 }\nfn other() { }\n";
        let (module, errors, _) = parse(source);
        assert!(!errors.is_empty());
        // The second function still parsed.
        assert_eq!(module.functions().count(), 2);
    }

    #[test]
    fn error_carries_line_number() {
        let (_, errors, _) = parse("fn main() {\n  let = 5\n}\n");
        assert_eq!(errors[0].line(), 2);
    }

    #[test]
    fn child_spans_nest_in_parents() {
        let (module, errors, _) = parse("fn main() { let x = 1 + 2 }\n");
        assert!(errors.is_empty(), "{:?}", errors);
        let f = module.functions().next().unwrap();
        let fspan = f.span;
        let body = &f.body;
        assert!(fspan.contains(body.span.start.line, body.span.start.column));
        for stmt in &body.stmts {
            let s = stmt.span();
            assert!(body.span.contains(s.start.line, s.start.column));
            assert!(body.span.contains(s.end.line, s.end.column));
        }
    }

    #[test]
    fn print_parse_print_is_stable() {
        let source = "fn add(a i32, b i32) -> i32 { return (a + b) }\n";
        let (module, errors, interner) = parse(source);
        assert!(errors.is_empty(), "{:?}", errors);
        let printed = Printer::new(&interner).module(&module);

        let mut interner2 = Interner::new();
        let mut parser2 = Parser::new(&printed, &mut interner2);
        let module2 = parser2.parse_module();
        assert!(parser2.errors.is_empty(), "{:?}", parser2.errors);
        drop(parser2);
        let printed2 = Printer::new(&interner2).module(&module2);
        assert_eq!(printed, printed2);
    }
}
