//! Type and borrow checking.
//!
//! The checker walks a parsed module and validates it: name resolution,
//! declared-vs-inferred type agreement, call arity and argument types,
//! lvalue discipline, array lengths, and the ownership rules (moves and
//! borrow overlap) via [`OwnershipTracker`].
//!
//! Errors are accumulated, never fatal: checking continues within a
//! declaration after each error so one run surfaces as many problems as
//! possible. The check succeeds iff the error list ends up empty.
//!
//! # Inference defaults
//!
//! Integer literals default to `i32`, float literals to `f64`, strings to
//! `[u8]`, and `nil` to a fresh type variable. A parameter whose type is a
//! free type variable accepts any argument; that is how the polymorphic
//! `println` builtin admits its per-type runtime dispatch.

use std::collections::{HashMap, HashSet};
use std::fmt;

use yar_base::{Interner, Span, Symbol};
use yar_syntax::ast::{
    parse_int_literal, BinaryOp, Block, Decl, Expr, FnDecl, ImplDecl, Module, Stmt, TypeExpr,
    UnaryOp,
};

use super::ownership::{OwnershipErrorKind, OwnershipTracker};
use super::types::{Prim, TypeEnv, YarType};
use crate::loader::import_stem;

/// A check error: message plus the source span it points at.
#[derive(Debug, Clone)]
pub struct CheckError {
    pub message: String,
    pub span: Span,
}

impl CheckError {
    pub fn line(&self) -> u32 {
        self.span.start.line
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line(), self.message)
    }
}

impl std::error::Error for CheckError {}

/// Checks one module. Construct fresh per module.
pub struct Checker<'a> {
    interner: &'a mut Interner,
    env: TypeEnv,
    ownership: OwnershipTracker,
    errors: Vec<CheckError>,
    /// Import namespaces visible to qualified calls (`module.Symbol(...)`).
    imports: HashSet<Symbol>,
    /// Generic parameter names of the declaration being checked, each mapped
    /// to a stable type-variable id.
    generic_vars: HashMap<Symbol, u32>,
    /// Resolution target for `Self` while checking impl methods.
    self_type: Option<YarType>,
    current_ret: YarType,
    loop_depth: u32,
}

impl<'a> Checker<'a> {
    pub fn new(interner: &'a mut Interner) -> Self {
        Self {
            interner,
            env: TypeEnv::new(),
            ownership: OwnershipTracker::new(),
            errors: Vec::new(),
            imports: HashSet::new(),
            generic_vars: HashMap::new(),
            self_type: None,
            current_ret: YarType::VOID,
            loop_depth: 0,
        }
    }

    /// Checks a whole module. Returns `Ok` iff no errors accumulated.
    pub fn check_module(&mut self, module: &Module) -> Result<(), Vec<CheckError>> {
        self.collect_imports(module);
        self.register_nominals(module);
        self.register_signatures(module);

        for decl in &module.decls {
            match decl {
                Decl::Const(c) => {
                    let vty = self.check_expr(&c.value);
                    let ty = match &c.ty {
                        Some(annot) => {
                            let declared = self.resolve_type(annot);
                            if !declared.compatible(&vty) {
                                let msg = format!(
                                    "type mismatch: constant declared {} but value has {}",
                                    self.describe(&declared),
                                    self.describe(&vty)
                                );
                                self.error(c.span, msg);
                            }
                            declared
                        }
                        None => vty,
                    };
                    self.env.define(c.name, ty, false);
                }
                Decl::Fn(f) => self.check_function(f, None),
                Decl::Impl(imp) => self.check_impl(imp),
                _ => {}
            }
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    pub fn errors(&self) -> &[CheckError] {
        &self.errors
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.errors.push(CheckError {
            message: message.into(),
            span,
        });
    }

    fn describe(&self, ty: &YarType) -> String {
        ty.describe(self.interner)
    }

    // ------------------------------------------------------------------
    // Registration passes
    // ------------------------------------------------------------------

    fn collect_imports(&mut self, module: &Module) {
        let mut namespaces = Vec::new();
        for import in module.imports() {
            match import.alias {
                Some(alias) => namespaces.push(alias),
                None => {
                    let stem = import_stem(&import.path).to_string();
                    namespaces.push(self.interner.intern(&stem));
                }
            }
        }
        self.imports.extend(namespaces);
    }

    /// Registers structs, enums, and type aliases in declaration order.
    /// Forward references are unresolved names, reported as unknown types.
    fn register_nominals(&mut self, module: &Module) {
        for decl in &module.decls {
            match decl {
                Decl::Struct(s) => {
                    self.set_generic_vars(&s.generics);
                    let fields: Vec<(Symbol, YarType)> = s
                        .fields
                        .iter()
                        .map(|(name, ty)| (*name, self.resolve_type(ty)))
                        .collect();
                    self.generic_vars.clear();
                    self.env.define_nominal(
                        s.name,
                        YarType::Struct {
                            name: s.name,
                            fields,
                            generics: s.generics.clone(),
                        },
                    );
                }
                Decl::Enum(e) => {
                    self.set_generic_vars(&e.generics);
                    let variants: Vec<(Symbol, Vec<YarType>)> = e
                        .variants
                        .iter()
                        .map(|v| {
                            let payload =
                                v.payload.iter().map(|ty| self.resolve_type(ty)).collect();
                            (v.name, payload)
                        })
                        .collect();
                    self.generic_vars.clear();
                    self.env.define_nominal(
                        e.name,
                        YarType::Enum {
                            name: e.name,
                            variants,
                            generics: e.generics.clone(),
                        },
                    );
                }
                Decl::TypeAlias(a) => {
                    let ty = self.resolve_type(&a.ty);
                    self.env.define_nominal(a.name, ty);
                }
                _ => {}
            }
        }
    }

    /// Defines every top-level function's signature in the root scope so
    /// bodies can call forward and each other.
    fn register_signatures(&mut self, module: &Module) {
        for f in module.functions() {
            let ty = self.fn_signature(f);
            self.env.define(f.name, ty, false);
        }
    }

    fn fn_signature(&mut self, f: &FnDecl) -> YarType {
        self.set_generic_vars(&f.generics);
        let params = f
            .params
            .iter()
            .map(|p| self.resolve_type(&p.ty))
            .collect();
        let ret = match &f.ret {
            Some(ty) => self.resolve_type(ty),
            None => YarType::VOID,
        };
        self.generic_vars.clear();
        YarType::Fn {
            params,
            ret: Box::new(ret),
        }
    }

    fn set_generic_vars(&mut self, generics: &[Symbol]) {
        self.generic_vars.clear();
        for name in generics {
            if let YarType::Var(id) = self.env.fresh_var() {
                self.generic_vars.insert(*name, id);
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn check_function(&mut self, f: &FnDecl, self_type: Option<YarType>) {
        self.set_generic_vars(&f.generics);
        self.self_type = self_type;
        self.current_ret = match &f.ret {
            Some(ty) => self.resolve_type(ty),
            None => YarType::VOID,
        };

        self.env.push_scope();
        for param in &f.params {
            let ty = self.resolve_type(&param.ty);
            self.env.define(param.name, ty, param.mutable);
        }
        for stmt in &f.body.stmts {
            self.check_stmt(stmt);
        }
        let released = self.env.pop_scope();
        self.ownership.release(&released);

        self.generic_vars.clear();
        self.self_type = None;
    }

    fn check_impl(&mut self, imp: &ImplDecl) {
        let target = match self.env.lookup_nominal(imp.target) {
            Some(ty) => Some(ty.clone()),
            None => {
                let name = self.interner.resolve(imp.target).to_string();
                self.error(imp.span, format!("unknown type '{}' in impl", name));
                None
            }
        };
        for method in &imp.methods {
            self.check_function(method, target.clone());
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_block(&mut self, block: &Block) {
        self.env.push_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        let released = self.env.pop_scope();
        self.ownership.release(&released);
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let {
                mutable,
                name,
                ty,
                init,
                span,
            } => {
                let init_ty = self.check_expr(init);
                self.track_move(init, &init_ty);
                let bound = match ty {
                    Some(annot) => {
                        let declared = self.resolve_type(annot);
                        if !declared.compatible(&init_ty) {
                            let msg = format!(
                                "type mismatch: declared {} but initializer has {}",
                                self.describe(&declared),
                                self.describe(&init_ty)
                            );
                            self.error(*span, msg);
                        }
                        declared
                    }
                    None => init_ty,
                };
                self.env.define(*name, bound, *mutable);
            }
            Stmt::ShortDecl { name, init, .. } => {
                let init_ty = self.check_expr(init);
                self.track_move(init, &init_ty);
                self.env.define(*name, init_ty, false);
            }
            Stmt::Assign {
                target,
                op: _,
                value,
                span,
            } => {
                if !target.is_lvalue() {
                    self.error(*span, "invalid assignment target");
                }
                let tty = self.check_assign_target(target);
                let vty = self.check_expr(value);
                if !tty.compatible(&vty) {
                    let msg = format!(
                        "type mismatch: cannot assign {} to {}",
                        self.describe(&vty),
                        self.describe(&tty)
                    );
                    self.error(*span, msg);
                }
            }
            Stmt::Return { value, span } => match value {
                Some(v) => {
                    let vty = self.check_expr(v);
                    if !self.current_ret.compatible(&vty) {
                        let msg = format!(
                            "return type mismatch: expected {}, found {}",
                            self.describe(&self.current_ret.clone()),
                            self.describe(&vty)
                        );
                        self.error(*span, msg);
                    }
                }
                None => {
                    if !self.current_ret.is_void() {
                        let msg = format!(
                            "missing return value: function returns {}",
                            self.describe(&self.current_ret.clone())
                        );
                        self.error(*span, msg);
                    }
                }
            },
            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => {
                self.check_condition(cond);
                self.check_block(then_block);
                if let Some(else_stmt) = else_branch {
                    self.check_stmt(else_stmt);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.check_condition(cond);
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => {
                self.env.push_scope();
                self.check_stmt(init);
                self.check_condition(cond);
                self.check_stmt(post);
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                let released = self.env.pop_scope();
                self.ownership.release(&released);
            }
            Stmt::ForIn {
                var,
                second,
                iter,
                body,
                span,
            } => {
                self.env.push_scope();
                self.check_for_in_bindings(var, second, iter, *span);
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
                let released = self.env.pop_scope();
                self.ownership.release(&released);
            }
            Stmt::Break { span } => {
                if self.loop_depth == 0 {
                    self.error(*span, "break outside of a loop");
                }
            }
            Stmt::Continue { span } => {
                if self.loop_depth == 0 {
                    self.error(*span, "continue outside of a loop");
                }
            }
            Stmt::Defer { call, .. } => {
                self.check_expr(call);
            }
            Stmt::Unsafe { block, .. } | Stmt::BlockStmt { block, .. } => {
                self.check_block(block);
            }
            Stmt::ExprStmt { expr, .. } => {
                self.check_expr(expr);
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr) {
        let ty = self.check_expr(cond);
        if !ty.compatible(&YarType::BOOL) {
            let msg = format!("condition must be bool, found {}", self.describe(&ty));
            self.error(cond.span(), msg);
        }
    }

    fn check_for_in_bindings(
        &mut self,
        var: &Symbol,
        second: &Option<Symbol>,
        iter: &Expr,
        span: Span,
    ) {
        let iter_ty = self.check_expr(iter);
        if matches!(
            iter,
            Expr::Binary {
                op: BinaryOp::Range,
                ..
            }
        ) {
            if second.is_some() {
                self.error(span, "range iteration yields a single value");
            }
            self.env.define(*var, iter_ty, false);
            return;
        }
        match iter_ty {
            YarType::Slice(elem) => {
                self.bind_loop_vars(var, second, *elem);
            }
            YarType::Array { elem, .. } => {
                self.bind_loop_vars(var, second, *elem);
            }
            YarType::Var(_) => {
                let v = self.env.fresh_var();
                self.bind_loop_vars(var, second, v);
            }
            other => {
                let msg = format!("type {} is not iterable", self.describe(&other));
                self.error(iter.span(), msg);
                let v = self.env.fresh_var();
                self.bind_loop_vars(var, second, v);
            }
        }
    }

    fn bind_loop_vars(&mut self, var: &Symbol, second: &Option<Symbol>, elem: YarType) {
        match second {
            Some(value_var) => {
                self.env
                    .define(*var, YarType::Prim(Prim::Usize), false);
                self.env.define(*value_var, elem, false);
            }
            None => {
                self.env.define(*var, elem, false);
            }
        }
    }

    /// Marks the initializer's source symbol moved when a non-copy value is
    /// bound away from it.
    fn track_move(&mut self, init: &Expr, init_ty: &YarType) {
        if init_ty.is_copy() {
            return;
        }
        if let Expr::Ident { name, .. } = init {
            if let Some(info) = self.env.lookup(*name) {
                let id = info.id;
                self.ownership.mark_moved(id);
            }
        }
    }

    /// Resolves the type of an assignment target without treating the target
    /// itself as a read (assigning to `x` is not a use of `x`).
    fn check_assign_target(&mut self, target: &Expr) -> YarType {
        match target {
            Expr::Ident { name, span } => match self.env.lookup(*name) {
                Some(info) => {
                    let ty = info.ty.clone();
                    if !info.mutable {
                        let text = self.interner.resolve(*name).to_string();
                        self.error(
                            *span,
                            format!("cannot assign to immutable binding '{}'", text),
                        );
                    }
                    ty
                }
                None => {
                    let text = self.interner.resolve(*name).to_string();
                    self.error(*span, format!("undefined name '{}'", text));
                    self.env.fresh_var()
                }
            },
            other => self.check_expr(other),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn check_expr(&mut self, expr: &Expr) -> YarType {
        match expr {
            Expr::Ident { name, span } => match self.env.lookup(*name) {
                Some(info) => {
                    let id = info.id;
                    let ty = info.ty.clone();
                    if self.ownership.is_moved(id) {
                        let text = self.interner.resolve(*name).to_string();
                        let kind = OwnershipErrorKind::UseOfMoved { name: text };
                        self.error(*span, kind.to_string());
                    }
                    ty
                }
                None => {
                    let text = self.interner.resolve(*name).to_string();
                    self.error(*span, format!("undefined name '{}'", text));
                    self.env.fresh_var()
                }
            },
            Expr::IntLit { .. } => YarType::I32,
            Expr::FloatLit { .. } => YarType::F64,
            Expr::CharLit { .. } => YarType::Prim(Prim::Char),
            Expr::StrLit { .. } => YarType::str_slice(),
            Expr::BoolLit { .. } => YarType::BOOL,
            Expr::NilLit { .. } => self.env.fresh_var(),
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => self.check_binary(*op, left, right, *span),
            Expr::Unary { op, operand, span } => self.check_unary(*op, operand, *span),
            Expr::Call { callee, args, span } => self.check_call(callee, args, *span),
            Expr::Index { base, index, .. } => {
                let bt = self.check_expr(base);
                let it = self.check_expr(index);
                if !it.is_integer() && !it.is_var() {
                    let msg = format!("index must be an integer, found {}", self.describe(&it));
                    self.error(index.span(), msg);
                }
                match bt {
                    YarType::Slice(elem) => *elem,
                    YarType::Array { elem, .. } => *elem,
                    YarType::Var(_) => self.env.fresh_var(),
                    other => {
                        let msg = format!("cannot index {}", self.describe(&other));
                        self.error(base.span(), msg);
                        self.env.fresh_var()
                    }
                }
            }
            Expr::Field { base, field, span } => self.check_field(base, *field, *span),
            Expr::StructLit { name, fields, span } => self.check_struct_lit(*name, fields, *span),
            Expr::ArrayLit { elems, .. } => {
                if elems.is_empty() {
                    let elem = self.env.fresh_var();
                    return YarType::Array {
                        elem: Box::new(elem),
                        len: 0,
                    };
                }
                let first = self.check_expr(&elems[0]);
                for elem in &elems[1..] {
                    let ty = self.check_expr(elem);
                    if !first.compatible(&ty) {
                        let msg = format!(
                            "array elements must share one type: {} vs {}",
                            self.describe(&first),
                            self.describe(&ty)
                        );
                        self.error(elem.span(), msg);
                    }
                }
                YarType::Array {
                    elem: Box::new(first),
                    len: elems.len() as u64,
                }
            }
            Expr::TupleLit { elems, .. } => {
                let tys = elems.iter().map(|e| self.check_expr(e)).collect();
                YarType::Tuple(tys)
            }
            // `?` currently passes its operand through; the unwrap waits on a
            // concrete result representation.
            Expr::Try { inner, .. } => self.check_expr(inner),
        }
    }

    fn check_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> YarType {
        let lt = self.check_expr(left);
        let rt = self.check_expr(right);

        if op.is_logical() {
            if !lt.compatible(&YarType::BOOL) || !rt.compatible(&YarType::BOOL) {
                let msg = format!(
                    "operator '{}' requires bool operands, found {} and {}",
                    op.as_str(),
                    self.describe(&lt),
                    self.describe(&rt)
                );
                self.error(span, msg);
            }
            return YarType::BOOL;
        }

        if op.is_comparison() {
            if !lt.compatible(&rt) {
                let msg = format!(
                    "comparison operands differ: {} vs {}",
                    self.describe(&lt),
                    self.describe(&rt)
                );
                self.error(span, msg);
            }
            return YarType::BOOL;
        }

        if op == BinaryOp::Range {
            if !lt.compatible(&rt) {
                let msg = format!(
                    "range bounds differ: {} vs {}",
                    self.describe(&lt),
                    self.describe(&rt)
                );
                self.error(span, msg);
            } else if !lt.is_integer() && !lt.is_var() {
                let msg = format!("range bounds must be integers, found {}", self.describe(&lt));
                self.error(span, msg);
            }
            return pick_concrete(lt, rt);
        }

        if !lt.compatible(&rt) {
            let msg = format!(
                "operator '{}' requires matching operand types: {} vs {}",
                op.as_str(),
                self.describe(&lt),
                self.describe(&rt)
            );
            self.error(span, msg);
        }
        pick_concrete(lt, rt)
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> YarType {
        match op {
            UnaryOp::Neg => {
                let ty = self.check_expr(operand);
                if !ty.is_numeric() && !ty.is_var() {
                    let msg = format!("cannot negate {}", self.describe(&ty));
                    self.error(span, msg);
                }
                ty
            }
            UnaryOp::Not => {
                let ty = self.check_expr(operand);
                if !ty.compatible(&YarType::BOOL) {
                    let msg = format!("operator '!' requires bool, found {}", self.describe(&ty));
                    self.error(span, msg);
                }
                YarType::BOOL
            }
            UnaryOp::BitNot => {
                let ty = self.check_expr(operand);
                if !ty.is_integer() && !ty.is_var() {
                    let msg = format!(
                        "operator '~' requires an integer, found {}",
                        self.describe(&ty)
                    );
                    self.error(span, msg);
                }
                ty
            }
            UnaryOp::Deref => {
                let ty = self.check_expr(operand);
                match ty {
                    YarType::Ref { elem, .. } => *elem,
                    YarType::RawPtr(elem) => *elem,
                    YarType::Var(_) => self.env.fresh_var(),
                    other => {
                        let msg = format!("cannot dereference {}", self.describe(&other));
                        self.error(span, msg);
                        self.env.fresh_var()
                    }
                }
            }
            UnaryOp::Ref => {
                let ty = self.check_expr(operand);
                self.mark_borrow(operand, false, span);
                YarType::Ref {
                    mutable: false,
                    elem: Box::new(ty),
                }
            }
            UnaryOp::RefMut => {
                let ty = self.check_expr(operand);
                self.mark_borrow(operand, true, span);
                YarType::Ref {
                    mutable: true,
                    elem: Box::new(ty),
                }
            }
        }
    }

    fn mark_borrow(&mut self, operand: &Expr, exclusive: bool, span: Span) {
        if let Expr::Ident { name, .. } = operand {
            if let Some(info) = self.env.lookup(*name) {
                let id = info.id;
                let text = self.interner.resolve(*name).to_string();
                let result = if exclusive {
                    self.ownership.borrow_exclusive(id, &text)
                } else {
                    self.ownership.borrow_shared(id, &text)
                };
                if let Err(kind) = result {
                    self.error(span, kind.to_string());
                }
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> YarType {
        // Qualified module call: `module.Symbol(...)`. Export validation is
        // cross-module work owned by the loader.
        if let Expr::Field { base, .. } = callee {
            if let Expr::Ident { name: ns, .. } = &**base {
                if self.imports.contains(ns) {
                    for arg in args {
                        self.check_expr(arg);
                    }
                    return self.env.fresh_var();
                }
            }
        }

        let (callee_ty, callee_name) = match callee {
            Expr::Ident { name, span } => match self.env.lookup(*name) {
                Some(info) => {
                    let text = self.interner.resolve(*name).to_string();
                    (info.ty.clone(), text)
                }
                None => {
                    let text = self.interner.resolve(*name).to_string();
                    self.error(*span, format!("undefined name '{}'", text));
                    for arg in args {
                        self.check_expr(arg);
                    }
                    return self.env.fresh_var();
                }
            },
            other => {
                self.error(
                    other.span(),
                    "callee must be a function name or module path",
                );
                for arg in args {
                    self.check_expr(arg);
                }
                return self.env.fresh_var();
            }
        };

        match callee_ty {
            YarType::Fn { params, ret } => {
                if params.len() != args.len() {
                    let msg = format!(
                        "wrong number of arguments to '{}': expected {}, found {}",
                        callee_name,
                        params.len(),
                        args.len()
                    );
                    self.error(span, msg);
                }
                // Argument checking continues past an arity mismatch so every
                // bad argument is reported.
                for (i, arg) in args.iter().enumerate() {
                    let aty = self.check_expr(arg);
                    if let Some(pty) = params.get(i) {
                        if !pty.compatible(&aty) {
                            let msg = format!(
                                "argument {} to '{}' has type {}, expected {}",
                                i + 1,
                                callee_name,
                                self.describe(&aty),
                                self.describe(pty)
                            );
                            self.error(arg.span(), msg);
                        }
                    }
                }
                *ret
            }
            YarType::Var(_) => {
                for arg in args {
                    self.check_expr(arg);
                }
                self.env.fresh_var()
            }
            other => {
                let msg = format!(
                    "'{}' is not a function (it has type {})",
                    callee_name,
                    self.describe(&other)
                );
                self.error(span, msg);
                for arg in args {
                    self.check_expr(arg);
                }
                self.env.fresh_var()
            }
        }
    }

    fn check_field(&mut self, base: &Expr, field: Symbol, span: Span) -> YarType {
        if let Expr::Ident { name: ns, .. } = base {
            if self.imports.contains(ns) {
                // Module member reference; validated against exports by the
                // cross-module pass.
                return self.env.fresh_var();
            }
        }
        let base_ty = self.check_expr(base);
        let target = match base_ty {
            YarType::Ref { elem, .. } => *elem,
            other => other,
        };
        match target {
            YarType::Struct {
                name: struct_name,
                fields,
                ..
            } => {
                for (fname, fty) in &fields {
                    if *fname == field {
                        return fty.clone();
                    }
                }
                let field_text = self.interner.resolve(field).to_string();
                let struct_text = self.interner.resolve(struct_name).to_string();
                self.error(
                    span,
                    format!("no field '{}' on struct '{}'", field_text, struct_text),
                );
                self.env.fresh_var()
            }
            YarType::Var(_) => self.env.fresh_var(),
            other => {
                let msg = format!("field access on non-struct type {}", self.describe(&other));
                self.error(span, msg);
                self.env.fresh_var()
            }
        }
    }

    fn check_struct_lit(&mut self, name: Symbol, fields: &[(Symbol, Expr)], span: Span) -> YarType {
        let nominal = self.env.lookup_nominal(name).cloned();
        let (struct_ty, decl_fields) = match nominal {
            Some(YarType::Struct {
                name: sname,
                fields: decl_fields,
                generics,
            }) => (
                YarType::Struct {
                    name: sname,
                    fields: decl_fields.clone(),
                    generics,
                },
                decl_fields,
            ),
            Some(other) => {
                let text = self.interner.resolve(name).to_string();
                let msg = format!(
                    "'{}' is not a struct (it is {})",
                    text,
                    self.describe(&other)
                );
                self.error(span, msg);
                for (_, value) in fields {
                    self.check_expr(value);
                }
                return self.env.fresh_var();
            }
            None => {
                let text = self.interner.resolve(name).to_string();
                self.error(span, format!("unknown struct '{}'", text));
                for (_, value) in fields {
                    self.check_expr(value);
                }
                return self.env.fresh_var();
            }
        };

        for (fname, value) in fields {
            let vty = self.check_expr(value);
            match decl_fields.iter().find(|(d, _)| d == fname) {
                Some((_, fty)) => {
                    if !fty.compatible(&vty) {
                        let field_text = self.interner.resolve(*fname).to_string();
                        let msg = format!(
                            "field '{}' has type {}, expected {}",
                            field_text,
                            self.describe(&vty),
                            self.describe(fty)
                        );
                        self.error(value.span(), msg);
                    }
                }
                None => {
                    let field_text = self.interner.resolve(*fname).to_string();
                    let struct_text = self.interner.resolve(name).to_string();
                    self.error(
                        value.span(),
                        format!("no field '{}' on struct '{}'", field_text, struct_text),
                    );
                }
            }
        }
        for (dname, _) in &decl_fields {
            if !fields.iter().any(|(f, _)| f == dname) {
                let field_text = self.interner.resolve(*dname).to_string();
                let struct_text = self.interner.resolve(name).to_string();
                self.error(
                    span,
                    format!(
                        "missing field '{}' in literal of '{}'",
                        field_text, struct_text
                    ),
                );
            }
        }
        struct_ty
    }

    // ------------------------------------------------------------------
    // Type resolution
    // ------------------------------------------------------------------

    /// Resolves a surface type to its structural counterpart. Generic
    /// instantiation returns the registered base type; arguments are checked
    /// for resolvability but not substituted (monomorphization is future
    /// work).
    pub fn resolve_type(&mut self, ty: &TypeExpr) -> YarType {
        match ty {
            TypeExpr::Named {
                segments,
                generics,
                span,
            } => {
                if segments.len() != 1 {
                    self.error(*span, "malformed type path");
                    return self.env.fresh_var();
                }
                let name = segments[0];
                if let Some(&id) = self.generic_vars.get(&name) {
                    return YarType::Var(id);
                }
                if name == Symbol::SELF_TYPE {
                    return match self.self_type.clone() {
                        Some(ty) => ty,
                        None => {
                            self.error(*span, "'Self' is only valid inside an impl");
                            self.env.fresh_var()
                        }
                    };
                }
                let text = self.interner.resolve(name).to_string();
                if let Some(prim) = Prim::from_name(&text) {
                    return YarType::Prim(prim);
                }
                if let Some(base) = self.env.lookup_nominal(name).cloned() {
                    for arg in generics {
                        self.resolve_type(arg);
                    }
                    return base;
                }
                self.error(*span, format!("unknown type '{}'", text));
                self.env.fresh_var()
            }
            TypeExpr::Ref { mutable, elem, .. } => YarType::Ref {
                mutable: *mutable,
                elem: Box::new(self.resolve_type(elem)),
            },
            TypeExpr::RawPtr { elem, .. } => YarType::RawPtr(Box::new(self.resolve_type(elem))),
            TypeExpr::Slice { elem, .. } => YarType::Slice(Box::new(self.resolve_type(elem))),
            TypeExpr::Array { elem, len, span } => {
                let elem_ty = self.resolve_type(elem);
                let length = match &**len {
                    Expr::IntLit { text, .. } => match parse_int_literal(text) {
                        Some(n) if n > 0 => n as u64,
                        Some(_) => {
                            self.error(*span, "array length must be positive");
                            0
                        }
                        None => {
                            self.error(*span, "invalid array length literal");
                            0
                        }
                    },
                    _ => {
                        self.error(*span, "array length must be an integer literal");
                        0
                    }
                };
                YarType::Array {
                    elem: Box::new(elem_ty),
                    len: length,
                }
            }
            TypeExpr::Tuple { elems, .. } => {
                YarType::Tuple(elems.iter().map(|e| self.resolve_type(e)).collect())
            }
            TypeExpr::Void { .. } => YarType::VOID,
        }
    }
}

/// Prefers a concrete type over an inference variable when reporting the
/// result of a binary operation.
fn pick_concrete(lt: YarType, rt: YarType) -> YarType {
    if lt.is_var() {
        rt
    } else {
        lt
    }
}
