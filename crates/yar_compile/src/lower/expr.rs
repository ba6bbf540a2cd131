//! Expression lowering.
//!
//! Every expression lowers to an operand string: literals to immediates,
//! string literals to `@global` references, everything else to the name of a
//! fresh temporary produced by the emitted instruction.

use yar_base::Result;
use yar_syntax::ast::{parse_int_literal, BinaryOp, Expr, UnaryOp};

use super::{callee_name, internal_error, Lowerer};
use crate::mir::{Inst, MirType, OpKind};

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> Result<String> {
        match expr {
            Expr::IntLit { text, .. } => {
                // Immediates are normalized to decimal spelling.
                Ok(parse_int_literal(text).unwrap_or(0).to_string())
            }
            Expr::FloatLit { text, .. } => Ok(normalize_float(text)),
            Expr::CharLit { value, .. } => Ok((*value as u32 as u8).to_string()),
            Expr::BoolLit { value, .. } => Ok(if *value { "1" } else { "0" }.to_string()),
            Expr::NilLit { .. } => Ok("0".to_string()),
            Expr::StrLit { value, .. } => {
                let value = value.clone();
                Ok(self.intern_string(&value))
            }
            Expr::Ident { name, .. } => {
                let name = self.interner.resolve(*name).to_string();
                let ty = self
                    .var_types
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(MirType::i32);
                let dest = self.fresh_temp();
                self.emit(Inst::Load {
                    dest: dest.clone(),
                    src: name,
                    ty,
                });
                Ok(dest)
            }
            Expr::Binary {
                op, left, right, ..
            } => self.lower_binary(*op, left, right),
            Expr::Unary { op, operand, .. } => self.lower_unary(*op, operand),
            Expr::Call { callee, args, .. } => self.lower_call(callee, args),
            Expr::Try { inner, .. } => self.lower_try(inner),
            Expr::Index { .. }
            | Expr::Field { .. }
            | Expr::StructLit { .. }
            | Expr::ArrayLit { .. }
            | Expr::TupleLit { .. } => Err(internal_error(
                "aggregate values are not lowerable to scalar MIR yet",
            )),
        }
    }

    fn lower_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<String> {
        if op == BinaryOp::Range {
            // Ranges only exist as for-loop iterators; the loop lowerer
            // consumes them before reaching here.
            return Err(internal_error("range expression outside a for loop"));
        }
        let operand_ty = self.infer_expr_type(left);
        let lhs = self.lower_expr(left)?;
        let rhs = self.lower_expr(right)?;
        let dest = self.fresh_temp();
        self.emit(Inst::BinOp {
            dest: dest.clone(),
            op: mir_op_of(op),
            lhs,
            rhs,
            ty: operand_ty,
        });
        Ok(dest)
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<String> {
        match op {
            UnaryOp::Neg => {
                let ty = self.infer_expr_type(operand);
                let value = self.lower_expr(operand)?;
                let dest = self.fresh_temp();
                self.emit(Inst::BinOp {
                    dest: dest.clone(),
                    op: OpKind::Sub,
                    lhs: "0".to_string(),
                    rhs: value,
                    ty,
                });
                Ok(dest)
            }
            UnaryOp::Not => {
                let value = self.lower_expr(operand)?;
                let dest = self.fresh_temp();
                self.emit(Inst::BinOp {
                    dest: dest.clone(),
                    op: OpKind::Xor,
                    lhs: value,
                    rhs: "1".to_string(),
                    ty: MirType::i1(),
                });
                Ok(dest)
            }
            UnaryOp::BitNot => {
                let ty = self.infer_expr_type(operand);
                let value = self.lower_expr(operand)?;
                let dest = self.fresh_temp();
                self.emit(Inst::BinOp {
                    dest: dest.clone(),
                    op: OpKind::Xor,
                    lhs: value,
                    rhs: "-1".to_string(),
                    ty,
                });
                Ok(dest)
            }
            UnaryOp::Deref => {
                let inner_ty = match self.infer_expr_type(operand) {
                    MirType::Ptr(inner) => *inner,
                    other => other,
                };
                let ptr = self.lower_expr(operand)?;
                let dest = self.fresh_temp();
                self.emit(Inst::Load {
                    dest: dest.clone(),
                    src: ptr,
                    ty: inner_ty,
                });
                Ok(dest)
            }
            // Borrows are checked, not yet represented: scalar MIR has no
            // address-of instruction, so the borrow passes its value through.
            UnaryOp::Ref | UnaryOp::RefMut => self.lower_expr(operand),
        }
    }

    fn lower_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<String> {
        let name = match callee_name(self.interner, callee) {
            Some(name) => name,
            None => return Err(internal_error("callee must be a function name")),
        };
        let mut lowered = Vec::new();
        for arg in args {
            lowered.push(self.lower_expr(arg)?);
        }

        // The builtin printer lowers as void; the emitter picks the concrete
        // runtime entry point from the argument's LLVM type.
        let ret = self.lookup_fn_ret(&name);
        if ret.is_void() {
            self.emit(Inst::Call {
                dest: None,
                callee: name,
                args: lowered,
                ret,
            });
            return Ok("0".to_string());
        }

        let dest = self.fresh_temp();
        self.emit(Inst::Call {
            dest: Some(dest.clone()),
            callee: name,
            args: lowered,
            ret,
        });
        Ok(dest)
    }

    /// `?` expands to check/error/ok blocks. The error predicate is a
    /// placeholder self-comparison whose true edge takes the ok path, so the
    /// error path never runs until a real result representation lands; the
    /// error block is still fully formed (defers, early return).
    fn lower_try(&mut self, inner: &Expr) -> Result<String> {
        let value_ty = self.infer_expr_type(inner);
        let value = self.lower_expr(inner)?;

        let id = self.fresh_label_id();
        let check_label = format!("check{}", id);
        let error_label = format!("error{}", id);
        let ok_label = format!("ok{}", id);

        self.emit(Inst::Br {
            label: check_label.clone(),
        });

        self.start_block(check_label);
        let pred = self.fresh_temp();
        self.emit(Inst::BinOp {
            dest: pred.clone(),
            op: OpKind::Eq,
            lhs: value.clone(),
            rhs: value.clone(),
            ty: value_ty,
        });
        self.emit(Inst::CondBr {
            cond: pred,
            then_label: ok_label.clone(),
            else_label: error_label.clone(),
        });

        self.start_block(error_label);
        self.emit(Inst::DeferRunAll);
        let ret_ty = self.fn_ret.clone();
        self.emit(Inst::Ret {
            value: Some(value.clone()),
            ty: ret_ty,
        });

        self.start_block(ok_label);
        Ok(value)
    }
}

fn mir_op_of(op: BinaryOp) -> OpKind {
    match op {
        BinaryOp::Add => OpKind::Add,
        BinaryOp::Sub => OpKind::Sub,
        BinaryOp::Mul => OpKind::Mul,
        BinaryOp::Div => OpKind::Div,
        BinaryOp::Rem => OpKind::Rem,
        BinaryOp::BitAnd | BinaryOp::And => OpKind::And,
        BinaryOp::BitOr | BinaryOp::Or => OpKind::Or,
        BinaryOp::BitXor => OpKind::Xor,
        BinaryOp::Shl => OpKind::Shl,
        BinaryOp::Shr => OpKind::Shr,
        BinaryOp::Eq => OpKind::Eq,
        BinaryOp::Ne => OpKind::Ne,
        BinaryOp::Lt => OpKind::Lt,
        BinaryOp::Le => OpKind::Le,
        BinaryOp::Gt => OpKind::Gt,
        BinaryOp::Ge => OpKind::Ge,
        BinaryOp::Range => OpKind::Add,
    }
}

/// LLVM float constants need a digit on both sides of the dot, including in
/// mantissas with an exponent (`1e9` must render as `1.0e9`).
fn normalize_float(text: &str) -> String {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (mantissa, exponent) = match cleaned.find(['e', 'E']) {
        Some(idx) => (&cleaned[..idx], &cleaned[idx..]),
        None => (cleaned.as_str(), ""),
    };
    let mantissa = if let Some(stripped) = mantissa.strip_prefix('.') {
        format!("0.{}", stripped)
    } else if mantissa.ends_with('.') {
        format!("{}0", mantissa)
    } else if !mantissa.contains('.') {
        format!("{}.0", mantissa)
    } else {
        mantissa.to_string()
    };
    format!("{}{}", mantissa, exponent)
}

#[cfg(test)]
mod tests {
    use super::super::tests::lower_src;
    use super::normalize_float;
    use crate::mir::{Inst, MirType, OpKind};

    #[test]
    fn float_normalization() {
        assert_eq!(normalize_float("3.14"), "3.14");
        assert_eq!(normalize_float(".5"), "0.5");
        assert_eq!(normalize_float("5."), "5.0");
        assert_eq!(normalize_float("1_000.25"), "1000.25");
        assert_eq!(normalize_float("2.5e-3"), "2.5e-3");
        assert_eq!(normalize_float("1e9"), "1.0e9");
    }

    #[test]
    fn int_literals_normalize_to_decimal() {
        let mir = lower_src("fn main() { let x = 0xFF }");
        let f = mir.function("main").unwrap();
        assert!(f.blocks[0]
            .insts
            .iter()
            .any(|i| matches!(i, Inst::Store { value, .. } if value == "255")));
    }

    #[test]
    fn identifier_reads_lower_to_loads() {
        let mir = lower_src("fn main() { let x = 1\nlet y = x }");
        let f = mir.function("main").unwrap();
        assert!(f.blocks[0]
            .insts
            .iter()
            .any(|i| matches!(i, Inst::Load { src, .. } if src == "x")));
    }

    #[test]
    fn negation_lowers_to_zero_minus() {
        let mir = lower_src("fn main() { let x = 1\nlet y = -x }");
        let f = mir.function("main").unwrap();
        assert!(f.blocks[0].insts.iter().any(
            |i| matches!(i, Inst::BinOp { op: OpKind::Sub, lhs, .. } if lhs == "0")
        ));
    }

    #[test]
    fn comparison_carries_operand_type() {
        let mir = lower_src("fn main() { let x = 1\nlet b = x < 2 }");
        let f = mir.function("main").unwrap();
        let cmp = f.blocks[0]
            .insts
            .iter()
            .find_map(|i| match i {
                Inst::BinOp {
                    op: OpKind::Lt, ty, ..
                } => Some(ty.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cmp, MirType::i32());
    }

    #[test]
    fn println_lowers_with_void_return() {
        let mir = lower_src("fn main() { println(42) }");
        let f = mir.function("main").unwrap();
        let call = f.blocks[0]
            .insts
            .iter()
            .find_map(|i| match i {
                Inst::Call {
                    dest, callee, ret, ..
                } => Some((dest.clone(), callee.clone(), ret.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(call.0, None);
        assert_eq!(call.1, "println");
        assert!(call.2.is_void());
    }

    #[test]
    fn try_expands_to_check_error_ok_blocks() {
        let mir = lower_src("fn get() i32 { return 1 }\nfn main() i32 { return get()? }");
        let f = mir.function("main").unwrap();
        let labels: Vec<&str> = f.blocks.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["entry", "check0", "error0", "ok0"]);

        // The error path runs defers and returns the value as-is.
        let error = &f.blocks[2];
        assert!(matches!(error.insts[0], Inst::DeferRunAll));
        assert!(matches!(error.insts[1], Inst::Ret { value: Some(_), .. }));

        // The predicate is the placeholder self-comparison.
        let check = &f.blocks[1];
        assert!(check.insts.iter().any(
            |i| matches!(i, Inst::BinOp { op: OpKind::Eq, lhs, rhs, .. } if lhs == rhs)
        ));
    }

    #[test]
    fn qualified_callee_flattens_to_symbol_name() {
        let mir = lower_src("use math\nfn main() { math.Square(3) }");
        let f = mir.function("main").unwrap();
        assert!(f.blocks[0]
            .insts
            .iter()
            .any(|i| matches!(i, Inst::Call { callee, .. } if callee == "Square")));
    }
}
