//! Rendering AST nodes back to surface syntax.
//!
//! The printer produces text the parser accepts, which makes structural
//! round-trip testing possible: parse, print, reparse, and the prints agree.
//! Binary and unary expressions are parenthesized so precedence survives the
//! trip; blocks render on one line with `;` separators, which the statement
//! layer treats like newlines.

use super::decl::{Decl, FnDecl, MethodSig, Module, Param};
use super::expr::Expr;
use super::stmt::{Block, Stmt};
use super::types::TypeExpr;
use yar_base::{Interner, Symbol};

/// Renders AST nodes using an interner to resolve names.
pub struct Printer<'a> {
    interner: &'a Interner,
}

impl<'a> Printer<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self { interner }
    }

    fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn module(&self, module: &Module) -> String {
        let mut out = String::new();
        if let Some(name) = module.name {
            out.push_str("module ");
            out.push_str(self.name(name));
            out.push('\n');
        }
        for decl in &module.decls {
            out.push_str(&self.decl(decl));
            out.push('\n');
        }
        out
    }

    pub fn decl(&self, decl: &Decl) -> String {
        match decl {
            Decl::Fn(f) => self.fn_decl(f),
            Decl::Struct(s) => {
                let mut out = String::new();
                if s.is_pub {
                    out.push_str("pub ");
                }
                out.push_str("struct ");
                out.push_str(self.name(s.name));
                out.push_str(&self.generics(&s.generics));
                out.push_str(" { ");
                for (i, (field, ty)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(self.name(*field));
                    out.push_str(": ");
                    out.push_str(&self.type_expr(ty));
                }
                out.push_str(" }");
                out
            }
            Decl::Enum(e) => {
                let mut out = String::new();
                if e.is_pub {
                    out.push_str("pub ");
                }
                out.push_str("enum ");
                out.push_str(self.name(e.name));
                out.push_str(&self.generics(&e.generics));
                out.push_str(" { ");
                for (i, variant) in e.variants.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(self.name(variant.name));
                    if !variant.payload.is_empty() {
                        out.push('(');
                        for (j, ty) in variant.payload.iter().enumerate() {
                            if j > 0 {
                                out.push_str(", ");
                            }
                            out.push_str(&self.type_expr(ty));
                        }
                        out.push(')');
                    }
                }
                out.push_str(" }");
                out
            }
            Decl::Trait(t) => {
                let mut out = String::new();
                out.push_str("trait ");
                out.push_str(self.name(t.name));
                out.push_str(" { ");
                for (i, sig) in t.methods.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    out.push_str(&self.method_sig(sig));
                }
                out.push_str(" }");
                out
            }
            Decl::Impl(imp) => {
                let mut out = String::new();
                out.push_str("impl ");
                if let Some(trait_name) = imp.trait_name {
                    out.push_str(self.name(trait_name));
                    out.push_str(" for ");
                }
                out.push_str(self.name(imp.target));
                out.push_str(" { ");
                for (i, method) in imp.methods.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    out.push_str(&self.fn_decl(method));
                }
                out.push_str(" }");
                out
            }
            Decl::TypeAlias(a) => format!(
                "type {} = {}",
                self.name(a.name),
                self.type_expr(&a.ty)
            ),
            Decl::Const(c) => {
                let mut out = String::new();
                out.push_str("const ");
                out.push_str(self.name(c.name));
                if let Some(ty) = &c.ty {
                    out.push_str(": ");
                    out.push_str(&self.type_expr(ty));
                }
                out.push_str(" = ");
                out.push_str(&self.expr(&c.value));
                out
            }
            Decl::Use(u) => {
                let mut out = String::new();
                out.push_str("use ");
                if let Some(alias) = u.alias {
                    out.push_str(self.name(alias));
                    out.push_str(" = ");
                }
                if u.path.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    out.push_str(&u.path);
                } else {
                    out.push('"');
                    out.push_str(&u.path);
                    out.push('"');
                }
                out
            }
        }
    }

    pub fn fn_decl(&self, f: &FnDecl) -> String {
        let mut out = String::new();
        if f.is_pub {
            out.push_str("pub ");
        }
        out.push_str("fn ");
        out.push_str(self.name(f.name));
        out.push_str(&self.generics(&f.generics));
        out.push('(');
        out.push_str(&self.params(&f.params));
        out.push(')');
        if let Some(ret) = &f.ret {
            out.push_str(" -> ");
            out.push_str(&self.type_expr(ret));
        }
        out.push(' ');
        out.push_str(&self.block(&f.body));
        out
    }

    fn method_sig(&self, sig: &MethodSig) -> String {
        let mut out = String::new();
        out.push_str("fn ");
        out.push_str(self.name(sig.name));
        out.push('(');
        out.push_str(&self.params(&sig.params));
        out.push(')');
        if let Some(ret) = &sig.ret {
            out.push_str(" -> ");
            out.push_str(&self.type_expr(ret));
        }
        out
    }

    fn params(&self, params: &[Param]) -> String {
        let mut out = String::new();
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let name = self.name(param.name);
            if name == "self" {
                if let TypeExpr::Ref { mutable, .. } = &param.ty {
                    out.push('&');
                    if *mutable {
                        out.push_str("mut ");
                    }
                    out.push_str("self");
                    continue;
                }
            }
            if param.mutable {
                out.push_str("mut ");
            }
            out.push_str(name);
            out.push(' ');
            out.push_str(&self.type_expr(&param.ty));
        }
        out
    }

    fn generics(&self, generics: &[Symbol]) -> String {
        if generics.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = generics.iter().map(|g| self.name(*g)).collect();
        format!("<{}>", names.join(", "))
    }

    pub fn block(&self, block: &Block) -> String {
        if block.stmts.is_empty() {
            return "{ }".to_string();
        }
        let stmts: Vec<String> = block.stmts.iter().map(|s| self.stmt(s)).collect();
        format!("{{ {} }}", stmts.join("; "))
    }

    pub fn stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Let {
                mutable,
                name,
                ty,
                init,
                ..
            } => {
                let mut out = String::new();
                out.push_str("let ");
                if *mutable {
                    out.push_str("mut ");
                }
                out.push_str(self.name(*name));
                if let Some(ty) = ty {
                    out.push_str(": ");
                    out.push_str(&self.type_expr(ty));
                }
                out.push_str(" = ");
                out.push_str(&self.expr(init));
                out
            }
            Stmt::ShortDecl { name, init, .. } => {
                format!("{} := {}", self.name(*name), self.expr(init))
            }
            Stmt::Assign {
                target, op, value, ..
            } => format!(
                "{} {} {}",
                self.expr(target),
                op.as_str(),
                self.expr(value)
            ),
            Stmt::Return { value, .. } => match value {
                Some(v) => format!("return {}", self.expr(v)),
                None => "return".to_string(),
            },
            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => {
                let mut out = format!("if {} {}", self.expr(cond), self.block(then_block));
                if let Some(else_stmt) = else_branch {
                    out.push_str(" else ");
                    out.push_str(&self.stmt(else_stmt));
                }
                out
            }
            Stmt::While { cond, body, .. } => {
                format!("while {} {}", self.expr(cond), self.block(body))
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => format!(
                "for {}; {}; {} {}",
                self.stmt(init),
                self.expr(cond),
                self.stmt(post),
                self.block(body)
            ),
            Stmt::ForIn {
                var,
                second,
                iter,
                body,
                ..
            } => {
                let mut out = String::new();
                out.push_str("for ");
                out.push_str(self.name(*var));
                if let Some(second) = second {
                    out.push_str(", ");
                    out.push_str(self.name(*second));
                }
                out.push_str(" in ");
                out.push_str(&self.expr(iter));
                out.push(' ');
                out.push_str(&self.block(body));
                out
            }
            Stmt::Break { .. } => "break".to_string(),
            Stmt::Continue { .. } => "continue".to_string(),
            Stmt::Defer { call, .. } => format!("defer {}", self.expr(call)),
            Stmt::Unsafe { block, .. } => format!("unsafe {}", self.block(block)),
            Stmt::BlockStmt { block, .. } => self.block(block),
            Stmt::ExprStmt { expr, .. } => self.expr(expr),
        }
    }

    pub fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Ident { name, .. } => self.name(*name).to_string(),
            Expr::IntLit { text, .. } => text.clone(),
            Expr::FloatLit { text, .. } => text.clone(),
            Expr::CharLit { value, .. } => format!("'{}'", escape_char(*value)),
            Expr::StrLit { value, .. } => format!("\"{}\"", escape_str(value)),
            Expr::BoolLit { value, .. } => value.to_string(),
            Expr::NilLit { .. } => "nil".to_string(),
            Expr::Binary {
                op, left, right, ..
            } => format!(
                "({} {} {})",
                self.expr(left),
                op.as_str(),
                self.expr(right)
            ),
            Expr::Unary { op, operand, .. } => {
                format!("({}{})", op.as_str(), self.expr(operand))
            }
            Expr::Call { callee, args, .. } => {
                let args: Vec<String> = args.iter().map(|a| self.expr(a)).collect();
                format!("{}({})", self.expr(callee), args.join(", "))
            }
            Expr::Index { base, index, .. } => {
                format!("{}[{}]", self.expr(base), self.expr(index))
            }
            Expr::Field { base, field, .. } => {
                format!("{}.{}", self.expr(base), self.name(*field))
            }
            Expr::StructLit { name, fields, .. } => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(f, e)| format!("{}: {}", self.name(*f), self.expr(e)))
                    .collect();
                format!("{}{{{}}}", self.name(*name), fields.join(", "))
            }
            Expr::ArrayLit { elems, .. } => {
                let elems: Vec<String> = elems.iter().map(|e| self.expr(e)).collect();
                format!("[{}]", elems.join(", "))
            }
            Expr::TupleLit { elems, .. } => {
                let elems: Vec<String> = elems.iter().map(|e| self.expr(e)).collect();
                format!("({})", elems.join(", "))
            }
            Expr::Try { inner, .. } => format!("{}?", self.expr(inner)),
        }
    }

    pub fn type_expr(&self, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Named {
                segments, generics, ..
            } => {
                let path: Vec<&str> = segments.iter().map(|s| self.name(*s)).collect();
                let mut out = path.join("::");
                if !generics.is_empty() {
                    let args: Vec<String> =
                        generics.iter().map(|g| self.type_expr(g)).collect();
                    out.push('<');
                    out.push_str(&args.join(", "));
                    out.push('>');
                }
                out
            }
            TypeExpr::Ref { mutable, elem, .. } => {
                if *mutable {
                    format!("&mut {}", self.type_expr(elem))
                } else {
                    format!("&{}", self.type_expr(elem))
                }
            }
            TypeExpr::RawPtr { elem, .. } => format!("*{}", self.type_expr(elem)),
            TypeExpr::Slice { elem, .. } => format!("[{}]", self.type_expr(elem)),
            TypeExpr::Array { elem, len, .. } => {
                format!("[{}; {}]", self.type_expr(elem), self.expr(len))
            }
            TypeExpr::Tuple { elems, .. } => {
                let elems: Vec<String> = elems.iter().map(|e| self.type_expr(e)).collect();
                format!("({})", elems.join(", "))
            }
            TypeExpr::Void { .. } => "()".to_string(),
        }
    }
}

fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\0' => "\\0".to_string(),
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        other => other.to_string(),
    }
}

fn escape_str(s: &str) -> String {
    let mut out = String::new();
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}
