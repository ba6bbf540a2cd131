//! Declaration parsing: functions, structs, enums, traits, impls, aliases,
//! consts, and use declarations.

use super::expr::LOWEST;
use super::Parser;
use crate::ast::{
    ConstDecl, Decl, EnumDecl, FnDecl, ImplDecl, MethodSig, Param, StructDecl, TraitDecl,
    TypeAliasDecl, TypeExpr, UseDecl, Variant,
};
use crate::token::TokenKind;
use yar_base::Symbol;

impl<'a> Parser<'a> {
    /// Parses one top-level declaration. `current` is its first token on
    /// entry and its last on exit. Returns `None` after recording an error;
    /// the caller resynchronizes.
    pub(crate) fn parse_decl(&mut self) -> Option<Decl> {
        let is_pub = if self.cur_is(TokenKind::Pub) {
            self.advance();
            true
        } else {
            false
        };

        match self.current.kind {
            TokenKind::Fn => self.parse_fn_decl(is_pub).map(Decl::Fn),
            TokenKind::Struct => self.parse_struct_decl(is_pub).map(Decl::Struct),
            TokenKind::Enum => self.parse_enum_decl(is_pub).map(Decl::Enum),
            TokenKind::Trait => self.parse_trait_decl().map(Decl::Trait),
            TokenKind::Impl => self.parse_impl_decl().map(Decl::Impl),
            TokenKind::Type => self.parse_type_alias().map(Decl::TypeAlias),
            TokenKind::Const => self.parse_const_decl().map(Decl::Const),
            TokenKind::Use => self.parse_use_decl().map(Decl::Use),
            _ => {
                self.unexpected_current_decl();
                self.advance();
                None
            }
        }
    }

    fn unexpected_current_decl(&mut self) {
        let found = super::describe_token(&self.current);
        let span = self.current.span;
        self.error(
            crate::error::ParseErrorKind::UnexpectedToken {
                expected: "a declaration".to_string(),
                found,
            },
            span,
        );
    }

    pub(crate) fn parse_fn_decl(&mut self, is_pub: bool) -> Option<FnDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a function name") {
            return None;
        }
        let name = self.intern_current();
        let generics = self.parse_generic_params()?;
        if !self.expect_peek(TokenKind::LParen, "(") {
            return None;
        }
        let params = self.parse_params()?;
        let ret = self.parse_return_type()?;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let body = self.parse_block();
        let span = start.merge(self.current.span);
        Some(FnDecl {
            is_pub,
            name,
            generics,
            params,
            ret,
            body,
            span,
        })
    }

    /// `<T, U>` after a function or type name. Empty when absent.
    fn parse_generic_params(&mut self) -> Option<Vec<Symbol>> {
        let mut generics = Vec::new();
        if !self.peek_is(TokenKind::Lt) {
            return Some(generics);
        }
        self.advance();
        loop {
            if !self.expect_peek(TokenKind::Ident, "a generic parameter") {
                return None;
            }
            generics.push(self.intern_current());
            if self.peek_is(TokenKind::Comma) {
                self.advance();
                continue;
            }
            break;
        }
        if !self.expect_peek(TokenKind::Gt, ">") {
            return None;
        }
        Some(generics)
    }

    /// Parameter list after `(`. `current` is `)` on exit.
    fn parse_params(&mut self) -> Option<Vec<Param>> {
        let mut params = Vec::new();
        self.skip_peek_newlines();
        if self.peek_is(TokenKind::RParen) {
            self.advance();
            return Some(params);
        }
        loop {
            self.advance();
            params.push(self.parse_param()?);
            if self.peek_is(TokenKind::Comma) {
                self.advance();
                self.skip_peek_newlines();
                if self.peek_is(TokenKind::RParen) {
                    break;
                }
                continue;
            }
            break;
        }
        if !self.expect_peek(TokenKind::RParen, ")") {
            return None;
        }
        Some(params)
    }

    /// One parameter: `mut? name Type`, or the `&self` / `&mut self`
    /// shorthand used inside impls and traits.
    fn parse_param(&mut self) -> Option<Param> {
        let start = self.current.span;

        if self.cur_is(TokenKind::Amp) {
            let mutable = if self.peek_is(TokenKind::Mut) {
                self.advance();
                true
            } else {
                false
            };
            if !self.expect_peek(TokenKind::Ident, "self") {
                return None;
            }
            let name = self.intern_current();
            let span = start.merge(self.current.span);
            let self_ty = Symbol::SELF_TYPE;
            return Some(Param {
                mutable: false,
                name,
                ty: TypeExpr::Ref {
                    mutable,
                    elem: Box::new(TypeExpr::Named {
                        segments: vec![self_ty],
                        generics: Vec::new(),
                        span,
                    }),
                    span,
                },
                span,
            });
        }

        let mutable = if self.cur_is(TokenKind::Mut) {
            self.advance();
            true
        } else {
            false
        };
        if !self.cur_is(TokenKind::Ident) {
            self.unexpected_current_decl();
            return None;
        }
        let name = self.intern_current();
        self.advance();
        let ty = self.parse_type()?;
        let span = start.merge(self.current.span);
        Some(Param {
            mutable,
            name,
            ty,
            span,
        })
    }

    /// Optional return type: either `-> Type` or a bare type before `{`.
    fn parse_return_type(&mut self) -> Option<Option<TypeExpr>> {
        if self.peek_is(TokenKind::Arrow) {
            self.advance();
            self.advance();
            return Some(Some(self.parse_type()?));
        }
        let starts_type = matches!(
            self.peek.kind,
            TokenKind::Ident
                | TokenKind::LBracket
                | TokenKind::Amp
                | TokenKind::Star
                | TokenKind::LParen
        );
        if starts_type {
            self.advance();
            return Some(Some(self.parse_type()?));
        }
        Some(None)
    }

    fn parse_struct_decl(&mut self, is_pub: bool) -> Option<StructDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a struct name") {
            return None;
        }
        let name = self.intern_current();
        let generics = self.parse_generic_params()?;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let mut fields = Vec::new();
        self.skip_peek_newlines();
        while !self.peek_is(TokenKind::RBrace) {
            if !self.expect_peek(TokenKind::Ident, "a field name") {
                return None;
            }
            let field = self.intern_current();
            if !self.expect_peek(TokenKind::Colon, ":") {
                return None;
            }
            self.advance();
            let ty = self.parse_type()?;
            fields.push((field, ty));
            if self.peek_is(TokenKind::Comma) {
                self.advance();
            }
            self.skip_peek_newlines();
        }
        self.advance();
        let span = start.merge(self.current.span);
        Some(StructDecl {
            is_pub,
            name,
            generics,
            fields,
            span,
        })
    }

    fn parse_enum_decl(&mut self, is_pub: bool) -> Option<EnumDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "an enum name") {
            return None;
        }
        let name = self.intern_current();
        let generics = self.parse_generic_params()?;
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let mut variants = Vec::new();
        self.skip_peek_newlines();
        while !self.peek_is(TokenKind::RBrace) {
            if !self.expect_peek(TokenKind::Ident, "a variant name") {
                return None;
            }
            let vstart = self.current.span;
            let vname = self.intern_current();
            let mut payload = Vec::new();
            if self.peek_is(TokenKind::LParen) {
                self.advance();
                loop {
                    self.advance();
                    payload.push(self.parse_type()?);
                    if self.peek_is(TokenKind::Comma) {
                        self.advance();
                        continue;
                    }
                    break;
                }
                if !self.expect_peek(TokenKind::RParen, ")") {
                    return None;
                }
            }
            let vspan = vstart.merge(self.current.span);
            variants.push(Variant {
                name: vname,
                payload,
                span: vspan,
            });
            if self.peek_is(TokenKind::Comma) {
                self.advance();
            }
            self.skip_peek_newlines();
        }
        self.advance();
        let span = start.merge(self.current.span);
        Some(EnumDecl {
            is_pub,
            name,
            generics,
            variants,
            span,
        })
    }

    /// Trait declarations carry method signatures only.
    fn parse_trait_decl(&mut self) -> Option<TraitDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a trait name") {
            return None;
        }
        let name = self.intern_current();
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let mut methods = Vec::new();
        loop {
            if self.peek_is(TokenKind::Newline) || self.peek_is(TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if self.peek_is(TokenKind::RBrace) || self.peek_is(TokenKind::Eof) {
                break;
            }
            if !self.expect_peek(TokenKind::Fn, "fn") {
                return None;
            }
            let mstart = self.current.span;
            if !self.expect_peek(TokenKind::Ident, "a method name") {
                return None;
            }
            let mname = self.intern_current();
            if !self.expect_peek(TokenKind::LParen, "(") {
                return None;
            }
            let params = self.parse_params()?;
            let ret = self.parse_return_type()?;
            let mspan = mstart.merge(self.current.span);
            methods.push(MethodSig {
                name: mname,
                params,
                ret,
                span: mspan,
            });
        }
        self.advance();
        let span = start.merge(self.current.span);
        Some(TraitDecl {
            name,
            methods,
            span,
        })
    }

    /// `impl Target { ... }` or `impl Trait for Target { ... }`.
    fn parse_impl_decl(&mut self) -> Option<ImplDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a type or trait name") {
            return None;
        }
        let first = self.intern_current();
        let (trait_name, target) = if self.peek_is(TokenKind::For) {
            self.advance();
            if !self.expect_peek(TokenKind::Ident, "a type name") {
                return None;
            }
            (Some(first), self.intern_current())
        } else {
            (None, first)
        };
        if !self.expect_peek(TokenKind::LBrace, "{") {
            return None;
        }
        let mut methods = Vec::new();
        loop {
            if self.peek_is(TokenKind::Newline) || self.peek_is(TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if self.peek_is(TokenKind::RBrace) || self.peek_is(TokenKind::Eof) {
                break;
            }
            if !self.expect_peek(TokenKind::Fn, "fn") {
                return None;
            }
            methods.push(self.parse_fn_decl(false)?);
        }
        self.advance();
        let span = start.merge(self.current.span);
        Some(ImplDecl {
            trait_name,
            target,
            methods,
            span,
        })
    }

    fn parse_type_alias(&mut self) -> Option<TypeAliasDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a type name") {
            return None;
        }
        let name = self.intern_current();
        if !self.expect_peek(TokenKind::Assign, "=") {
            return None;
        }
        self.advance();
        let ty = self.parse_type()?;
        let span = start.merge(self.current.span);
        Some(TypeAliasDecl { name, ty, span })
    }

    fn parse_const_decl(&mut self) -> Option<ConstDecl> {
        let start = self.current.span;
        if !self.expect_peek(TokenKind::Ident, "a constant name") {
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
        if !self.expect_peek(TokenKind::Assign, "=") {
            return None;
        }
        self.advance();
        let value = self.parse_expression(LOWEST)?;
        let span = start.merge(value.span());
        Some(ConstDecl {
            name,
            ty,
            value,
            span,
        })
    }

    /// `use path`, `use "std:name"`, `use "./file.yar"`, or
    /// `use alias = path`.
    fn parse_use_decl(&mut self) -> Option<UseDecl> {
        let start = self.current.span;
        self.advance();
        let mut alias = None;
        if self.cur_is(TokenKind::Ident) && self.peek_is(TokenKind::Assign) {
            alias = Some(self.intern_current());
            self.advance();
            self.advance();
        }
        let path = match self.current.kind {
            TokenKind::Ident | TokenKind::Str => self.current.lexeme.clone(),
            _ => {
                self.unexpected_current_decl();
                return None;
            }
        };
        let span = start.merge(self.current.span);
        Some(UseDecl { alias, path, span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Module, Printer};
    use yar_base::Interner;

    fn parse(source: &str) -> (Module, Interner) {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner);
        let module = parser.parse_module();
        assert!(parser.errors.is_empty(), "{:?}", parser.errors);
        drop(parser);
        (module, interner)
    }

    fn decl_str(source: &str) -> String {
        let (module, interner) = parse(source);
        Printer::new(&interner).decl(&module.decls[0])
    }

    #[test]
    fn fn_with_go_style_params() {
        assert_eq!(
            decl_str("fn add(a i32, b i32) i32 { return (a + b) }"),
            "fn add(a i32, b i32) -> i32 { return (a + b) }"
        );
    }

    #[test]
    fn fn_with_arrow_return() {
        assert_eq!(
            decl_str("fn id(x i32) -> i32 { return x }"),
            "fn id(x i32) -> i32 { return x }"
        );
    }

    #[test]
    fn fn_with_mut_param_and_generics() {
        assert_eq!(
            decl_str("pub fn fill<T>(mut buf [u8], x T) { }"),
            "pub fn fill<T>(mut buf [u8], x T) { }"
        );
    }

    #[test]
    fn struct_decl() {
        assert_eq!(
            decl_str("struct P {\n  x: i32,\n  y: i32,\n}"),
            "struct P { x: i32, y: i32 }"
        );
    }

    #[test]
    fn enum_with_payload_variants() {
        assert_eq!(
            decl_str("enum Shape { Dot, Rect(i32, i32) }"),
            "enum Shape { Dot, Rect(i32, i32) }"
        );
    }

    #[test]
    fn trait_with_signatures() {
        assert_eq!(
            decl_str("trait Area {\n  fn area(&self) -> i32\n}"),
            "trait Area { fn area(&self) -> i32 }"
        );
    }

    #[test]
    fn impl_trait_for_type() {
        assert_eq!(
            decl_str("impl Area for P {\n  fn area(&self) -> i32 { return 0 }\n}"),
            "impl Area for P { fn area(&self) -> i32 { return 0 } }"
        );
    }

    #[test]
    fn type_alias_and_const() {
        assert_eq!(decl_str("type Bytes = [u8]"), "type Bytes = [u8]");
        assert_eq!(decl_str("const N: i32 = 0x10"), "const N: i32 = 0x10");
    }

    #[test]
    fn use_forms() {
        assert_eq!(decl_str("use math"), "use math");
        assert_eq!(decl_str("use \"./util.yar\""), "use \"./util.yar\"");
        assert_eq!(decl_str("use m = \"std:fmt\""), "use m = \"std:fmt\"");
    }
}
