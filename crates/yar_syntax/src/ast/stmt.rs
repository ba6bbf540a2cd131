//! Statement nodes and blocks.

use super::expr::Expr;
use super::types::TypeExpr;
use yar_base::{Span, Symbol};

/// Assignment operators recognized at the statement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
        }
    }

    /// The binary operator a compound assignment expands to, if any.
    pub fn binary_op(self) -> Option<super::expr::BinaryOp> {
        use super::expr::BinaryOp;
        let op = match self {
            AssignOp::Assign => return None,
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Rem => BinaryOp::Rem,
            AssignOp::BitAnd => BinaryOp::BitAnd,
            AssignOp::BitOr => BinaryOp::BitOr,
            AssignOp::BitXor => BinaryOp::BitXor,
            AssignOp::Shl => BinaryOp::Shl,
            AssignOp::Shr => BinaryOp::Shr,
        };
        Some(op)
    }
}

/// A brace-delimited sequence of statements.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// A statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// `let mut? name (: Type)? = init` — the initializer is mandatory.
    Let {
        mutable: bool,
        name: Symbol,
        ty: Option<TypeExpr>,
        init: Expr,
        span: Span,
    },
    /// `name := init`. Binds immutably with the initializer's type.
    ShortDecl {
        name: Symbol,
        init: Expr,
        span: Span,
    },
    /// `target op value` where op is `=` or a compound form. The target is
    /// syntactically any expression; the checker rejects non-lvalues.
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// `if cond { ... } else ...` — an `else if` chain is a nested `If` in
    /// the else branch; a plain `else` is a `Stmt::BlockStmt`.
    If {
        cond: Expr,
        then_block: Block,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    /// C-style three-part form: `for init; cond; post { ... }`.
    For {
        init: Box<Stmt>,
        cond: Expr,
        post: Box<Stmt>,
        body: Block,
        span: Span,
    },
    /// Range/iterator form: `for x in expr` or `for i, x in expr`.
    ForIn {
        var: Symbol,
        second: Option<Symbol>,
        iter: Expr,
        body: Block,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    /// `defer call(...)` — the wrapped expression must be a call.
    Defer {
        call: Expr,
        span: Span,
    },
    Unsafe {
        block: Block,
        span: Span,
    },
    BlockStmt {
        block: Block,
        span: Span,
    },
    ExprStmt {
        expr: Expr,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let { span, .. }
            | Stmt::ShortDecl { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::ForIn { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Defer { span, .. }
            | Stmt::Unsafe { span, .. }
            | Stmt::BlockStmt { span, .. }
            | Stmt::ExprStmt { span, .. } => *span,
        }
    }
}
