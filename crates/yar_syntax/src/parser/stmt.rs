//! Statement parsing and blocks.
//!
//! At the start of a statement the parser inspects the current keyword:
//! `let`, `return`, `if`, `while`, `for`, `break`, `continue`, `defer`,
//! `unsafe`, and `{` take dedicated parsers. Anything else is parsed as an
//! expression; a following `:=` turns it into a short declaration, an
//! assignment operator turns it into an assignment, and otherwise it is an
//! expression statement.

use super::expr::LOWEST;
use super::Parser;
use crate::ast::{AssignOp, Block, Expr, Stmt};
use crate::error::ParseErrorKind;
use crate::token::TokenKind;

fn assign_op_of(kind: TokenKind) -> Option<AssignOp> {
    let op = match kind {
        TokenKind::Assign => AssignOp::Assign,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        TokenKind::StarAssign => AssignOp::Mul,
        TokenKind::SlashAssign => AssignOp::Div,
        TokenKind::PercentAssign => AssignOp::Rem,
        TokenKind::AmpAssign => AssignOp::BitAnd,
        TokenKind::PipeAssign => AssignOp::BitOr,
        TokenKind::CaretAssign => AssignOp::BitXor,
        TokenKind::ShlAssign => AssignOp::Shl,
        TokenKind::ShrAssign => AssignOp::Shr,
        _ => return None,
    };
    Some(op)
}

impl<'a> Parser<'a> {
    /// Parses a brace-delimited block. `current` is `{` on entry and `}` on
    /// exit. Statement errors are recorded and the parser resynchronizes, so
    /// one bad statement does not lose the rest of the block.
    pub(crate) fn parse_block(&mut self) -> Block {
        let start = self.current.span;
        let mut stmts = Vec::new();
        self.advance();
        loop {
            match self.current.kind {
                TokenKind::RBrace | TokenKind::Eof => break,
                TokenKind::Newline | TokenKind::Semicolon => self.advance(),
                _ => match self.parse_stmt() {
                    Some(stmt) => {
                        stmts.push(stmt);
                        self.advance();
                    }
                    None => self.synchronize(),
                },
            }
        }
        if self.cur_is(TokenKind::Eof) {
            let span = self.current.span;
            self.error(
                ParseErrorKind::MissingDelimiter {
                    delimiter: "}".to_string(),
                },
                span,
            );
        }
        Block {
            stmts,
            span: start.merge(self.current.span),
        }
    }

    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        match self.current.kind {
            TokenKind::Let => self.parse_let(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Break => Some(Stmt::Break {
                span: self.current.span,
            }),
            TokenKind::Continue => Some(Stmt::Continue {
                span: self.current.span,
            }),
            TokenKind::Defer => self.parse_defer(),
            TokenKind::Unsafe => self.parse_unsafe(),
            TokenKind::LBrace => {
                let block = self.parse_block();
                let span = block.span;
                Some(Stmt::BlockStmt { block, span })
            }
            _ => self.parse_expr_led_stmt(),
        }
    }

    fn parse_let(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        let mutable = if self.peek_is(TokenKind::Mut) {
            self.advance();
            true
        } else {
            false
        };
        if !self.expect_peek(TokenKind::Ident, "a binding name") {
            return None;
        }
        let name = self.intern_current();
        let ty = if self.peek_is(TokenKind::Colon) {
            self.advance();
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };
        // The initializer is mandatory: no uninitialized bindings.
        if !self.expect_peek(TokenKind::Assign, "=") {
            return None;
        }
        self.advance();
        let init = self.parse_expression(LOWEST)?;
        let span = start.merge(init.span());
        Some(Stmt::Let {
            mutable,
            name,
            ty,
            init,
            span,
        })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        if self.peek.kind.is_terminator() {
            return Some(Stmt::Return {
                value: None,
                span: start,
            });
        }
        self.advance();
        let value = self.parse_expression(LOWEST)?;
        let span = start.merge(value.span());
        Some(Stmt::Return {
            value: Some(value),
            span,
        })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        self.advance();
        let cond = self.parse_condition()?;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let then_block = self.parse_block();
        let mut span = start.merge(self.current.span);

        let else_branch = if self.peek_is(TokenKind::Else) {
            self.advance();
            if self.peek_is(TokenKind::If) {
                self.advance();
                let nested = self.parse_if()?;
                span = span.merge(nested.span());
                Some(Box::new(nested))
            } else {
                if !self.expect_peek(TokenKind::LBrace, "{") {
                    return None;
                }
                let block = self.parse_block();
                let block_span = block.span;
                span = span.merge(block_span);
                Some(Box::new(Stmt::BlockStmt {
                    block,
                    span: block_span,
                }))
            }
        } else {
            None
        };

        Some(Stmt::If {
            cond,
            then_block,
            else_branch,
            span,
        })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        self.advance();
        let cond = self.parse_condition()?;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let body = self.parse_block();
        let span = start.merge(self.current.span);
        Some(Stmt::While { cond, body, span })
    }

    /// Two surface forms share the keyword. After the loop variable, one
    /// token decides: `in` selects the range form, `=`/`:=` the three-part
    /// C-style form.
    fn parse_for(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a loop variable or init statement") {
            return None;
        }

        if self.peek_is(TokenKind::In) || self.peek_is(TokenKind::Comma) {
            let var = self.intern_current();
            let second = if self.peek_is(TokenKind::Comma) {
                self.advance();
                if !self.expect_peek(TokenKind::Ident, "a loop variable") {
                    return None;
                }
                Some(self.intern_current())
            } else {
                None
            };
            if !self.expect_peek(TokenKind::In, "in") {
                return None;
            }
            self.advance();
            let saved = self.allow_struct_lit;
            self.allow_struct_lit = false;
            let iter = self.parse_expression(LOWEST);
            self.allow_struct_lit = saved;
            let iter = iter?;
            if !self.expect_peek(TokenKind::LBrace, "{") {
                return None;
            }
            let body = self.parse_block();
            let span = start.merge(self.current.span);
            return Some(Stmt::ForIn {
                var,
                second,
                iter,
                body,
                span,
            });
        }

        // Three-part form. `current` already sits on the first token of the
        // init statement.
        let saved = self.allow_struct_lit;
        self.allow_struct_lit = false;
        let result = self.parse_for_three_part(start);
        self.allow_struct_lit = saved;
        result
    }

    fn parse_for_three_part(&mut self, start: crate::Span) -> Option<Stmt> {
        let init = self.parse_stmt()?;
        if !self.expect_peek(TokenKind::Semicolon, ";") {
            return None;
        }
        self.advance();
        let cond = self.parse_expression(LOWEST)?;
        if !self.expect_peek(TokenKind::Semicolon, ";") {
            return None;
        }
        self.advance();
        let post = self.parse_stmt()?;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let body = self.parse_block();
        let span = start.merge(self.current.span);
        Some(Stmt::For {
            init: Box::new(init),
            cond,
            post: Box::new(post),
            body,
            span,
        })
    }

    fn parse_defer(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        self.advance();
        let call = self.parse_expression(LOWEST)?;
        if !matches!(call, Expr::Call { .. }) {
            let span = call.span();
            self.error(ParseErrorKind::DeferRequiresCall, span);
            return None;
        }
        let span = start.merge(call.span());
        Some(Stmt::Defer { call, span })
    }

    fn parse_unsafe(&mut self) -> Option<Stmt> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let block = self.parse_block();
        let span = start.merge(self.current.span);
        Some(Stmt::Unsafe { block, span })
    }

    /// Expression-led statements: short declaration, assignment, or a bare
    /// expression.
    fn parse_expr_led_stmt(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(LOWEST)?;

        if self.peek_is(TokenKind::ColonAssign) {
            let name = match &expr {
                Expr::Ident { name, .. } => *name,
                _ => {
                    let span = expr.span();
                    self.error(ParseErrorKind::ShortDeclTarget, span);
                    return None;
                }
            };
            self.advance();
            self.advance();
            let init = self.parse_expression(LOWEST)?;
            let span = expr.span().merge(init.span());
            return Some(Stmt::ShortDecl { name, init, span });
        }

        if let Some(op) = assign_op_of(self.peek.kind) {
            self.advance();
            self.advance();
            let value = self.parse_expression(LOWEST)?;
            let span = expr.span().merge(value.span());
            return Some(Stmt::Assign {
                target: expr,
                op,
                value,
                span,
            });
        }

        let span = expr.span();
        Some(Stmt::ExprStmt { expr, span })
    }

    /// Parses an `if`/`while`/`for` header expression with struct literals
    /// disabled, so `ident {` reads as condition-then-block.
    fn parse_condition(&mut self) -> Option<Expr> {
        let saved = self.allow_struct_lit;
        self.allow_struct_lit = false;
        let cond = self.parse_expression(LOWEST);
        self.allow_struct_lit = saved;
        cond
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Module, Printer};
    use yar_base::Interner;

    fn parse_body(body: &str) -> (Module, Interner) {
        let source = format!("fn main() {{\n{}\n}}\n", body);
        let mut interner = Interner::new();
        let mut parser = Parser::new(&source, &mut interner);
        let module = parser.parse_module();
        assert!(parser.errors.is_empty(), "{:?}", parser.errors);
        drop(parser);
        (module, interner)
    }

    fn first_stmt_str(body: &str) -> String {
        let (module, interner) = parse_body(body);
        let f = module.functions().next().unwrap();
        Printer::new(&interner).stmt(&f.body.stmts[0])
    }

    #[test]
    fn let_with_annotation() {
        assert_eq!(
            first_stmt_str("let mut x: i32 = 0"),
            "let mut x: i32 = 0"
        );
    }

    #[test]
    fn short_declaration() {
        assert_eq!(first_stmt_str("x := 5"), "x := 5");
    }

    #[test]
    fn compound_assignment() {
        assert_eq!(first_stmt_str("x <<= 2"), "x <<= 2");
        assert_eq!(first_stmt_str("x += 1"), "x += 1");
    }

    #[test]
    fn else_if_chain_nests() {
        let rendered = first_stmt_str("if a { } else if b { } else { }");
        assert_eq!(rendered, "if a { } else if b { } else { }");
    }

    #[test]
    fn while_condition_allows_block_start() {
        assert_eq!(
            first_stmt_str("while x < 10 { x = x + 1 }"),
            "while (x < 10) { x = (x + 1) }"
        );
    }

    #[test]
    fn for_range_form() {
        assert_eq!(
            first_stmt_str("for i in 0..3 { println(i) }"),
            "for i in (0 .. 3) { println(i) }"
        );
    }

    #[test]
    fn for_two_variable_form() {
        assert_eq!(
            first_stmt_str("for i, x in items { }"),
            "for i, x in items { }"
        );
    }

    #[test]
    fn for_three_part_form() {
        assert_eq!(
            first_stmt_str("for i := 0; i < 10; i += 1 { }"),
            "for i := 0; (i < 10); i += 1 { }"
        );
    }

    #[test]
    fn defer_requires_a_call() {
        let source = "fn main() { defer x + 1 }";
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner);
        parser.parse_module();
        assert!(parser
            .errors
            .iter()
            .any(|e| e.to_string().contains("defer requires a call")));
    }

    #[test]
    fn defer_wraps_call() {
        assert_eq!(first_stmt_str("defer close(f)"), "defer close(f)");
    }

    #[test]
    fn unsafe_block() {
        assert_eq!(first_stmt_str("unsafe { x := 1 }"), "unsafe { x := 1 }");
    }

    #[test]
    fn return_without_value() {
        assert_eq!(first_stmt_str("return"), "return");
    }
}
