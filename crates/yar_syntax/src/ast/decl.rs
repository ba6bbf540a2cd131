//! Top-level declarations and the module node.

use super::expr::Expr;
use super::stmt::Block;
use super::types::TypeExpr;
use yar_base::{Span, Symbol};

/// A function parameter. `&self`/`&mut self` shorthands parse into a
/// parameter named `self` whose type is a reference to `Self`.
#[derive(Debug, Clone)]
pub struct Param {
    pub mutable: bool,
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// `fn name<T>(params) RetType { body }`.
#[derive(Debug, Clone)]
pub struct FnDecl {
    pub is_pub: bool,
    pub name: Symbol,
    pub generics: Vec<Symbol>,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub is_pub: bool,
    pub name: Symbol,
    pub generics: Vec<Symbol>,
    pub fields: Vec<(Symbol, TypeExpr)>,
    pub span: Span,
}

/// A tuple-payload enum variant: `Some(T)`, `None`.
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: Symbol,
    pub payload: Vec<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub is_pub: bool,
    pub name: Symbol,
    pub generics: Vec<Symbol>,
    pub variants: Vec<Variant>,
    pub span: Span,
}

/// A method signature inside a trait declaration (no body).
#[derive(Debug, Clone)]
pub struct MethodSig {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub ret: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TraitDecl {
    pub name: Symbol,
    pub methods: Vec<MethodSig>,
    pub span: Span,
}

/// `impl Target { ... }` or `impl Trait for Target { ... }`.
#[derive(Debug, Clone)]
pub struct ImplDecl {
    pub trait_name: Option<Symbol>,
    pub target: Symbol,
    pub methods: Vec<FnDecl>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

/// `use path`, `use "./file.yar"`, or `use alias = path`.
///
/// The path is kept as written; the loader resolves it against the stdlib
/// prefix, the importer's directory, or the project root.
#[derive(Debug, Clone)]
pub struct UseDecl {
    pub alias: Option<Symbol>,
    pub path: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Fn(FnDecl),
    Struct(StructDecl),
    Enum(EnumDecl),
    Trait(TraitDecl),
    Impl(ImplDecl),
    TypeAlias(TypeAliasDecl),
    Const(ConstDecl),
    Use(UseDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Fn(d) => d.span,
            Decl::Struct(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::Trait(d) => d.span,
            Decl::Impl(d) => d.span,
            Decl::TypeAlias(d) => d.span,
            Decl::Const(d) => d.span,
            Decl::Use(d) => d.span,
        }
    }
}

/// A parsed source file: optional `module name` header plus declarations.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: Option<Symbol>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl Module {
    /// All `use` declarations, in source order.
    pub fn imports(&self) -> impl Iterator<Item = &UseDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Use(u) => Some(u),
            _ => None,
        })
    }

    /// All top-level functions, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &FnDecl> {
        self.decls.iter().filter_map(|d| match d {
            Decl::Fn(f) => Some(f),
            _ => None,
        })
    }
}
