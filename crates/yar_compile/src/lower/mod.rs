//! AST → MIR lowering.
//!
//! One MIR function per non-generic source function, each starting from a
//! single `entry` block. Temporaries (`t0`, `t1`, ...) and block labels
//! (`then0`, `cond1`, ...) come from monotonic counters scoped to the
//! lowerer, so names are unique within a module.
//!
//! Variables lower to named allocas: `let`/`:=` emit an alloca plus a store,
//! reads emit loads, assignments emit stores. String literals intern into
//! module globals with synthetic `str.N` names and lower to `@str.N`
//! operands. Control flow lowers to the block shapes described in the
//! submodule docs; an explicit [`LoopFrame`] stack gives `break`/`continue`
//! their targets, so nested loops are unambiguous.
//!
//! Lowering assumes a checked AST. Internal invariant violations (a `break`
//! with no enclosing loop reaching this far) abort with a diagnostic rather
//! than producing malformed MIR.

mod expr;
mod stmt;

use std::collections::HashMap;

use yar_base::{Diagnostic, Interner, Result};
use yar_syntax::ast::{Decl, Expr, FnDecl, Module, TypeExpr};

use crate::mir::{BasicBlock, Inst, MirFunction, MirModule, MirType};

/// Break/continue targets for one enclosing loop.
pub(crate) struct LoopFrame {
    pub continue_label: String,
    pub break_label: String,
}

pub struct Lowerer<'a> {
    pub(crate) interner: &'a Interner,
    pub(crate) module: MirModule,
    temp_count: u32,
    label_count: u32,
    str_count: u32,
    pub(crate) loop_stack: Vec<LoopFrame>,
    cur_fn: usize,
    cur_block: usize,
    /// Per-function map from variable name to the type of its slot.
    pub(crate) var_types: HashMap<String, MirType>,
    pub(crate) fn_ret: MirType,
}

/// Lowers every non-generic function of a checked module to MIR.
pub fn lower_module(interner: &Interner, module: &Module) -> Result<MirModule> {
    let mut lowerer = Lowerer::new(interner);
    for decl in &module.decls {
        if let Decl::Fn(f) = decl {
            // Generic bodies wait for monomorphization.
            if f.generics.is_empty() {
                lowerer.lower_function(f)?;
            }
        }
    }
    Ok(lowerer.module)
}

impl<'a> Lowerer<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            module: MirModule::new(),
            temp_count: 0,
            label_count: 0,
            str_count: 0,
            loop_stack: Vec::new(),
            cur_fn: 0,
            cur_block: 0,
            var_types: HashMap::new(),
            fn_ret: MirType::void(),
        }
    }

    pub(crate) fn fresh_temp(&mut self) -> String {
        let n = self.temp_count;
        self.temp_count += 1;
        format!("t{}", n)
    }

    /// One id per control-flow construct; its blocks share the suffix
    /// (`then3`/`else3`/`merge3`).
    pub(crate) fn fresh_label_id(&mut self) -> u32 {
        let n = self.label_count;
        self.label_count += 1;
        n
    }

    /// Interns a string constant, returning its `@`-operand.
    pub(crate) fn intern_string(&mut self, value: &str) -> String {
        let name = format!("str.{}", self.str_count);
        self.str_count += 1;
        self.module.globals.push(crate::mir::GlobalString {
            name: name.clone(),
            value: value.to_string(),
        });
        format!("@{}", name)
    }

    pub(crate) fn emit(&mut self, inst: Inst) {
        self.module.functions[self.cur_fn].blocks[self.cur_block]
            .insts
            .push(inst);
    }

    /// Appends a fresh block to the current function and makes it current.
    pub(crate) fn start_block(&mut self, label: String) {
        let blocks = &mut self.module.functions[self.cur_fn].blocks;
        blocks.push(BasicBlock::new(label));
        self.cur_block = blocks.len() - 1;
    }

    pub(crate) fn current_terminated(&self) -> bool {
        self.module.functions[self.cur_fn].blocks[self.cur_block].is_terminated()
    }

    fn lower_function(&mut self, f: &FnDecl) -> Result<()> {
        let name = self.interner.resolve(f.name).to_string();
        let params: Vec<(String, MirType)> = f
            .params
            .iter()
            .map(|p| {
                (
                    self.interner.resolve(p.name).to_string(),
                    self.mir_type_of(&p.ty),
                )
            })
            .collect();
        let ret = match &f.ret {
            Some(ty) => self.mir_type_of(ty),
            None => MirType::void(),
        };

        self.module.functions.push(MirFunction {
            name,
            params: params.clone(),
            ret: ret.clone(),
            blocks: vec![BasicBlock::new("entry")],
        });
        self.cur_fn = self.module.functions.len() - 1;
        self.cur_block = 0;
        self.var_types.clear();
        self.fn_ret = ret.clone();
        for (pname, pty) in params {
            self.var_types.insert(pname, pty);
        }

        for stmt in &f.body.stmts {
            self.lower_stmt(stmt)?;
        }

        // Fall-through exit still runs defers; a void function gets its
        // implicit return, anything else returns a zero of its type.
        if !self.current_terminated() {
            self.emit(Inst::DeferRunAll);
            if ret.is_void() {
                self.emit(Inst::Ret {
                    value: None,
                    ty: MirType::void(),
                });
            } else {
                self.emit(Inst::Ret {
                    value: Some("0".to_string()),
                    ty: ret,
                });
            }
        }
        Ok(())
    }

    /// Maps a surface type to its MIR counterpart. Unsigned integers share
    /// their width's LLVM spelling; aggregates have no scalar slot type and
    /// default to `i32`.
    pub(crate) fn mir_type_of(&self, ty: &TypeExpr) -> MirType {
        match ty {
            TypeExpr::Named { segments, .. } => {
                if segments.len() == 1 {
                    let name = self.interner.resolve(segments[0]);
                    return MirType::prim(prim_llvm_name(name));
                }
                MirType::i32()
            }
            TypeExpr::Ref { elem, .. } | TypeExpr::RawPtr { elem, .. } => {
                MirType::ptr(self.mir_type_of(elem))
            }
            TypeExpr::Slice { elem, .. } | TypeExpr::Array { elem, .. } => {
                MirType::ptr(self.mir_type_of(elem))
            }
            TypeExpr::Tuple { .. } => MirType::i32(),
            TypeExpr::Void { .. } => MirType::void(),
        }
    }

    /// Shallow type inference over expressions, enough to give loads, stores,
    /// and binary ops their operand types.
    pub(crate) fn infer_expr_type(&self, expr: &Expr) -> MirType {
        match expr {
            Expr::IntLit { .. } => MirType::i32(),
            Expr::FloatLit { .. } => MirType::prim("double"),
            Expr::BoolLit { .. } => MirType::i1(),
            Expr::CharLit { .. } => MirType::prim("i8"),
            Expr::StrLit { .. } => MirType::byte_ptr(),
            Expr::NilLit { .. } => MirType::byte_ptr(),
            Expr::Ident { name, .. } => {
                let text = self.interner.resolve(*name);
                self.var_types
                    .get(text)
                    .cloned()
                    .unwrap_or_else(MirType::i32)
            }
            Expr::Binary { op, left, .. } => {
                if expr_op_is_comparison(*op) {
                    MirType::i1()
                } else {
                    self.infer_expr_type(left)
                }
            }
            Expr::Unary { op, operand, .. } => match op {
                yar_syntax::ast::UnaryOp::Not => MirType::i1(),
                yar_syntax::ast::UnaryOp::Deref => match self.infer_expr_type(operand) {
                    MirType::Ptr(inner) => *inner,
                    other => other,
                },
                yar_syntax::ast::UnaryOp::Ref | yar_syntax::ast::UnaryOp::RefMut => {
                    MirType::ptr(self.infer_expr_type(operand))
                }
                _ => self.infer_expr_type(operand),
            },
            Expr::Call { callee, .. } => match callee_name(self.interner, callee) {
                Some(name) => self.lookup_fn_ret(&name),
                None => MirType::i32(),
            },
            Expr::Try { inner, .. } => self.infer_expr_type(inner),
            _ => MirType::i32(),
        }
    }

    /// Return type of a callee: `println` is void, known functions report
    /// their signature, unknown callees default to `i32` and become external
    /// declarations at emit time.
    pub(crate) fn lookup_fn_ret(&self, name: &str) -> MirType {
        if name == "println" {
            return MirType::void();
        }
        match self.module.function(name) {
            Some(f) => f.ret.clone(),
            None => MirType::i32(),
        }
    }
}

pub(crate) fn callee_name(interner: &Interner, callee: &Expr) -> Option<String> {
    match callee {
        Expr::Ident { name, .. } => Some(interner.resolve(*name).to_string()),
        // A qualified `module.Symbol` call flattens to the symbol name; the
        // linker sees one flat namespace.
        Expr::Field { field, .. } => Some(interner.resolve(*field).to_string()),
        _ => None,
    }
}

fn expr_op_is_comparison(op: yar_syntax::ast::BinaryOp) -> bool {
    op.is_comparison()
}

fn prim_llvm_name(name: &str) -> &'static str {
    match name {
        "i8" | "u8" | "char" => "i8",
        "i16" | "u16" => "i16",
        "i64" | "u64" | "usize" => "i64",
        "f32" => "float",
        "f64" => "double",
        "bool" => "i1",
        "void" => "void",
        _ => "i32",
    }
}

pub(crate) fn internal_error(message: impl Into<String>) -> Diagnostic {
    Diagnostic::new(message, yar_base::Span::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yar_syntax::Parser;

    pub(crate) fn lower_src(source: &str) -> MirModule {
        let mut interner = Interner::new();
        let mut parser = Parser::new(source, &mut interner);
        let module = parser.parse_module();
        assert!(parser.errors.is_empty(), "parse: {:?}", parser.errors);
        drop(parser);
        lower_module(&interner, &module).expect("lowering failed")
    }

    #[test]
    fn empty_void_function_gets_implicit_return() {
        let mir = lower_src("fn main() { }");
        let f = mir.function("main").unwrap();
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].label, "entry");
        assert!(matches!(
            f.blocks[0].insts.as_slice(),
            [Inst::DeferRunAll, Inst::Ret { value: None, .. }]
        ));
    }

    #[test]
    fn every_block_ends_with_a_terminator() {
        let mir = lower_src(
            "fn main() {\n\
               let mut x: i32 = 0\n\
               while x < 10 {\n\
                 if x == 5 { break }\n\
                 x = x + 1\n\
               }\n\
             }",
        );
        let f = mir.function("main").unwrap();
        for block in &f.blocks {
            assert!(
                block.is_terminated(),
                "block {} lacks a terminator",
                block.label
            );
        }
    }

    #[test]
    fn generic_functions_are_not_lowered() {
        let mir = lower_src("fn id<T>(x T) T { return x }\nfn main() { }");
        assert!(mir.function("id").is_none());
        assert!(mir.function("main").is_some());
    }

    #[test]
    fn string_literals_intern_into_globals() {
        let mir = lower_src("fn main() { println(\"a\")\nprintln(\"b\") }");
        assert_eq!(mir.globals.len(), 2);
        assert_eq!(mir.globals[0].name, "str.0");
        assert_eq!(mir.globals[0].value, "a");
        assert_eq!(mir.globals[1].name, "str.1");
    }

    #[test]
    fn unknown_callees_default_to_i32_return() {
        let mir = lower_src("fn main() { let x = external(1) }");
        let f = mir.function("main").unwrap();
        let call = f.blocks[0]
            .insts
            .iter()
            .find_map(|i| match i {
                Inst::Call { ret, dest, .. } => Some((ret.clone(), dest.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(call.0, MirType::i32());
        assert!(call.1.is_some());
    }

    #[test]
    fn known_callee_return_types_are_found() {
        let mir = lower_src(
            "fn flag() bool { return true }\n\
             fn main() { let b = flag() }",
        );
        let f = mir.function("main").unwrap();
        let ret = f
            .blocks
            .iter()
            .flat_map(|b| &b.insts)
            .find_map(|i| match i {
                Inst::Call { ret, .. } => Some(ret.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(ret, MirType::i1());
    }
}
