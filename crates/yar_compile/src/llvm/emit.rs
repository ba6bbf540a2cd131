//! The LLVM IR emitter.
//!
//! Globals emit first (private unnamed_addr NUL-terminated byte arrays),
//! then functions, then the external declarations accumulated on demand.
//!
//! Each function gets its own [`FnEmitter`], constructed and discarded
//! around the function: the local/value tables cannot leak between
//! functions. In the entry block every parameter is spilled to a stack slot
//! named `<param>.addr`, so name-based loads and stores hit memory uniformly
//! whether the name was a parameter or a local.
//!
//! Value resolution order for an operand token: `@name` materializes a GEP
//! to the named global; a tracked SSA value is used directly; a named local
//! is loaded; anything else passes through as an immediate.
//!
//! Signed semantics are the integer defaults: `sdiv`, `srem`, `ashr`, and
//! signed `icmp` predicates.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::types::{escape_constant, is_float_type, llvm_type, string_array_type};
use crate::mir::{Inst, MirFunction, MirModule, MirType, OpKind};

/// Emits a whole MIR module as LLVM IR text.
pub fn emit_module(mir: &MirModule) -> String {
    let mut out = String::new();

    let mut globals: HashMap<String, String> = HashMap::new();
    for global in &mir.globals {
        let array_ty = string_array_type(&global.value);
        out.push_str(&format!(
            "@{} = private unnamed_addr constant {} c\"{}\\00\"\n",
            global.name,
            array_ty,
            escape_constant(&global.value)
        ));
        globals.insert(global.name.clone(), array_ty);
    }
    if !mir.globals.is_empty() {
        out.push('\n');
    }

    let defined: HashSet<&str> = mir.functions.iter().map(|f| f.name.as_str()).collect();
    let mut declared: BTreeMap<String, String> = BTreeMap::new();

    for function in &mir.functions {
        let mut emitter = FnEmitter {
            mir,
            globals: &globals,
            defined: &defined,
            declared: &mut declared,
            locals: HashMap::new(),
            values: HashMap::new(),
            aux: 0,
            body: String::new(),
        };
        out.push_str(&emitter.emit_function(function));
        out.push('\n');
    }

    for decl in declared.values() {
        out.push_str(decl);
        out.push('\n');
    }

    out
}

/// Per-function emitter state, discarded at the function boundary.
struct FnEmitter<'m> {
    mir: &'m MirModule,
    globals: &'m HashMap<String, String>,
    defined: &'m HashSet<&'m str>,
    declared: &'m mut BTreeMap<String, String>,
    /// local name → (pointer register, element type).
    locals: HashMap<String, (String, String)>,
    /// MIR value name → (LLVM value text, type).
    values: HashMap<String, (String, String)>,
    /// Counter for emitter-synthesized registers (GEPs, resolver loads).
    aux: u32,
    body: String,
}

impl<'m> FnEmitter<'m> {
    fn emit_function(&mut self, f: &MirFunction) -> String {
        let params: Vec<String> = f
            .params
            .iter()
            .map(|(name, ty)| format!("{} %{}", llvm_type(ty), name))
            .collect();
        let mut text = format!(
            "define {} @{}({}) {{\n",
            llvm_type(&f.ret),
            f.name,
            params.join(", ")
        );

        for (i, block) in f.blocks.iter().enumerate() {
            self.body.clear();
            self.body.push_str(&format!("{}:\n", block.label));
            if i == 0 {
                self.spill_params(f);
            }
            for inst in &block.insts {
                self.emit_inst(inst);
            }
            text.push_str(&self.body);
        }

        text.push_str("}\n");
        text
    }

    /// Spills each parameter to a fresh `<param>.addr` slot so later
    /// name-based loads find it in memory.
    fn spill_params(&mut self, f: &MirFunction) {
        for (name, ty) in &f.params {
            let ty_text = llvm_type(ty);
            let slot = format!("%{}.addr", name);
            self.line(format!("{} = alloca {}", slot, ty_text));
            self.line(format!("store {} %{}, {}* {}", ty_text, name, ty_text, slot));
            self.locals.insert(name.clone(), (slot, ty_text));
        }
    }

    fn line(&mut self, text: String) {
        self.body.push_str("  ");
        self.body.push_str(&text);
        self.body.push('\n');
    }

    fn fresh_aux(&mut self) -> String {
        let n = self.aux;
        self.aux += 1;
        format!("%s{}", n)
    }

    /// Resolves a MIR operand to an LLVM value, synthesizing a GEP for
    /// globals or a load for locals when needed.
    fn resolve(&mut self, operand: &str, fallback_ty: &str) -> (String, String) {
        if let Some(name) = operand.strip_prefix('@') {
            if let Some(array_ty) = self.globals.get(name).cloned() {
                let reg = self.fresh_aux();
                self.line(format!(
                    "{} = getelementptr inbounds {}, {}* @{}, i32 0, i32 0",
                    reg, array_ty, array_ty, name
                ));
                return (reg, "i8*".to_string());
            }
        }
        if let Some((value, ty)) = self.values.get(operand) {
            return (value.clone(), ty.clone());
        }
        if let Some((slot, ty)) = self.locals.get(operand).cloned() {
            let reg = self.fresh_aux();
            self.line(format!("{} = load {}, {}* {}", reg, ty, ty, slot));
            return (reg, ty);
        }
        (operand.to_string(), fallback_ty.to_string())
    }

    fn emit_inst(&mut self, inst: &Inst) {
        match inst {
            Inst::Alloca { name, ty } => {
                let ty_text = non_void(llvm_type(ty));
                let reg = format!("%{}", name);
                self.line(format!("{} = alloca {}", reg, ty_text));
                self.locals.insert(name.clone(), (reg, ty_text));
            }
            Inst::Load { dest, src, ty } => {
                let ty_text = non_void(llvm_type(ty));
                let reg = format!("%{}", dest);
                if let Some((value, _)) = self.values.get(src).cloned() {
                    // Loading through a pointer-typed SSA value (deref).
                    self.line(format!("{} = load {}, {}* {}", reg, ty_text, ty_text, value));
                } else if let Some((slot, slot_ty)) = self.locals.get(src).cloned() {
                    self.line(format!(
                        "{} = load {}, {}* {}",
                        reg, slot_ty, slot_ty, slot
                    ));
                    self.values.insert(dest.clone(), (reg, slot_ty));
                    return;
                } else {
                    self.line(format!("; load from unknown slot '{}'", src));
                    return;
                }
                self.values.insert(dest.clone(), (reg, ty_text));
            }
            Inst::Store { value, dest, ty } => {
                let ty_text = non_void(llvm_type(ty));
                let (value_text, _) = self.resolve(value, &ty_text);
                if let Some((slot, slot_ty)) = self.locals.get(dest).cloned() {
                    self.line(format!(
                        "store {} {}, {}* {}",
                        slot_ty, value_text, slot_ty, slot
                    ));
                } else if let Some((ptr, _)) = self.values.get(dest).cloned() {
                    self.line(format!(
                        "store {} {}, {}* {}",
                        ty_text, value_text, ty_text, ptr
                    ));
                } else {
                    self.line(format!("; store to unknown slot '{}'", dest));
                }
            }
            Inst::BinOp {
                dest,
                op,
                lhs,
                rhs,
                ty,
            } => {
                let operand_ty = non_void(llvm_type(ty));
                let (l, lty) = self.resolve(lhs, &operand_ty);
                let (r, _) = self.resolve(rhs, &operand_ty);
                let operand_ty = if lty != operand_ty { lty } else { operand_ty };
                let reg = format!("%{}", dest);
                if op.is_comparison() {
                    if is_float_type(&operand_ty) {
                        let pred = fcmp_predicate(*op);
                        self.line(format!(
                            "{} = fcmp {} {} {}, {}",
                            reg, pred, operand_ty, l, r
                        ));
                    } else {
                        let pred = icmp_predicate(*op);
                        self.line(format!(
                            "{} = icmp {} {} {}, {}",
                            reg, pred, operand_ty, l, r
                        ));
                    }
                    self.values.insert(dest.clone(), (reg, "i1".to_string()));
                } else {
                    let opcode = if is_float_type(&operand_ty) {
                        float_opcode(*op)
                    } else {
                        int_opcode(*op)
                    };
                    self.line(format!("{} = {} {} {}, {}", reg, opcode, operand_ty, l, r));
                    self.values.insert(dest.clone(), (reg, operand_ty));
                }
            }
            Inst::Call {
                dest,
                callee,
                args,
                ret,
            } => self.emit_call(dest.as_deref(), callee, args, ret),
            Inst::Br { label } => {
                self.line(format!("br label %{}", label));
            }
            Inst::CondBr {
                cond,
                then_label,
                else_label,
            } => {
                let (cond_text, _) = self.resolve(cond, "i1");
                self.line(format!(
                    "br i1 {}, label %{}, label %{}",
                    cond_text, then_label, else_label
                ));
            }
            Inst::Ret { value, ty } => match value {
                None => self.line("ret void".to_string()),
                Some(v) => {
                    let ty_text = llvm_type(ty);
                    if ty_text == "void" {
                        self.line("ret void".to_string());
                        return;
                    }
                    let (text, _) = self.resolve(v, &ty_text);
                    self.line(format!("ret {} {}", ty_text, text));
                }
            },
            // Defer scaffolding renders as comments until the runtime stack
            // exists.
            Inst::DeferPush { call } => {
                if let Inst::Call { callee, args, .. } = &**call {
                    self.line(format!(
                        "; defer push: call @{}({})",
                        callee,
                        args.join(", ")
                    ));
                } else {
                    self.line("; defer push".to_string());
                }
            }
            Inst::DeferRunAll => {
                self.line("; defer run-all".to_string());
            }
        }
    }

    fn emit_call(&mut self, dest: Option<&str>, callee: &str, args: &[String], ret: &MirType) {
        let signature = self.mir.function(callee).map(|f| f.params.clone());
        let mut resolved: Vec<(String, String)> = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            let expected = signature
                .as_ref()
                .and_then(|params| params.get(i))
                .map(|(_, ty)| llvm_type(ty))
                .unwrap_or_else(|| "i32".to_string());
            let (text, ty) = self.resolve(arg, &expected);
            resolved.push((text, ty));
        }

        // The builtin printer dispatches on the argument's LLVM type.
        if callee == "println" {
            let (text, ty) = resolved
                .first()
                .cloned()
                .unwrap_or_else(|| ("0".to_string(), "i32".to_string()));
            let (entry, param_ty) = match ty.as_str() {
                "i8*" => ("println", "i8*"),
                "i1" => ("println_bool", "i1"),
                _ => ("println_i32", "i32"),
            };
            self.declare(entry, &format!("declare void @{}({})", entry, param_ty));
            self.line(format!("call void @{}({} {})", entry, param_ty, text));
            return;
        }

        let ret_ty = llvm_type(ret);
        let arg_list: Vec<String> = resolved
            .iter()
            .map(|(text, ty)| format!("{} {}", ty, text))
            .collect();

        if !self.defined.contains(callee) {
            let param_tys: Vec<String> = resolved.iter().map(|(_, ty)| ty.clone()).collect();
            self.declare(
                callee,
                &format!("declare {} @{}({})", ret_ty, callee, param_tys.join(", ")),
            );
        }

        match dest {
            Some(dest) if ret_ty != "void" => {
                let reg = format!("%{}", dest);
                self.line(format!(
                    "{} = call {} @{}({})",
                    reg,
                    ret_ty,
                    callee,
                    arg_list.join(", ")
                ));
                self.values.insert(dest.to_string(), (reg, ret_ty));
            }
            _ => {
                self.line(format!("call {} @{}({})", ret_ty, callee, arg_list.join(", ")));
            }
        }
    }

    fn declare(&mut self, name: &str, decl: &str) {
        if !self.declared.contains_key(name) {
            self.declared.insert(name.to_string(), decl.to_string());
        }
    }
}

fn non_void(ty: String) -> String {
    if ty == "void" {
        "i32".to_string()
    } else {
        ty
    }
}

fn int_opcode(op: OpKind) -> &'static str {
    match op {
        OpKind::Add => "add",
        OpKind::Sub => "sub",
        OpKind::Mul => "mul",
        OpKind::Div => "sdiv",
        OpKind::Rem => "srem",
        OpKind::And => "and",
        OpKind::Or => "or",
        OpKind::Xor => "xor",
        OpKind::Shl => "shl",
        OpKind::Shr => "ashr",
        _ => "add",
    }
}

fn float_opcode(op: OpKind) -> &'static str {
    match op {
        OpKind::Add => "fadd",
        OpKind::Sub => "fsub",
        OpKind::Mul => "fmul",
        OpKind::Div => "fdiv",
        OpKind::Rem => "frem",
        _ => "fadd",
    }
}

fn icmp_predicate(op: OpKind) -> &'static str {
    match op {
        OpKind::Eq => "eq",
        OpKind::Ne => "ne",
        OpKind::Lt => "slt",
        OpKind::Le => "sle",
        OpKind::Gt => "sgt",
        OpKind::Ge => "sge",
        _ => "eq",
    }
}

fn fcmp_predicate(op: OpKind) -> &'static str {
    match op {
        OpKind::Eq => "oeq",
        OpKind::Ne => "one",
        OpKind::Lt => "olt",
        OpKind::Le => "ole",
        OpKind::Gt => "ogt",
        OpKind::Ge => "oge",
        _ => "oeq",
    }
}
