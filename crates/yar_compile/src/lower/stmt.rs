//! Statement lowering.
//!
//! Block shapes:
//!
//! ```text
//! if/else:            while:              for x in a..b:
//!   <cond>              br cond             alloca x; store a
//!   condbr then else    cond: condbr        <end evaluated once>
//!   then: .. br merge     body exit         br cond
//!   else: .. br merge   body: ..            cond: load, cmp, condbr
//!   merge:                br cond           body: .. increment
//!                       exit:                 br cond
//!                                           exit:
//! ```
//!
//! A loop pushes a [`LoopFrame`](super::LoopFrame) with its continue target
//! (the cond block) and break target (the exit block) while its body lowers.

use yar_base::Result;
use yar_syntax::ast::{BinaryOp, Block, Expr, Stmt};

use super::{internal_error, Lowerer, LoopFrame};
use crate::mir::{Inst, MirType, OpKind};

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Let {
                name, ty, init, ..
            } => {
                let slot_ty = match ty {
                    Some(annot) => self.mir_type_of(annot),
                    None => self.infer_expr_type(init),
                };
                let value = self.lower_expr(init)?;
                let name = self.interner.resolve(*name).to_string();
                self.emit(Inst::Alloca {
                    name: name.clone(),
                    ty: slot_ty.clone(),
                });
                self.emit(Inst::Store {
                    value,
                    dest: name.clone(),
                    ty: slot_ty.clone(),
                });
                self.var_types.insert(name, slot_ty);
                Ok(())
            }
            Stmt::ShortDecl { name, init, .. } => {
                let slot_ty = self.infer_expr_type(init);
                let value = self.lower_expr(init)?;
                let name = self.interner.resolve(*name).to_string();
                self.emit(Inst::Alloca {
                    name: name.clone(),
                    ty: slot_ty.clone(),
                });
                self.emit(Inst::Store {
                    value,
                    dest: name.clone(),
                    ty: slot_ty.clone(),
                });
                self.var_types.insert(name, slot_ty);
                Ok(())
            }
            Stmt::Assign {
                target, op, value, ..
            } => self.lower_assign(target, *op, value),
            Stmt::Return { value, .. } => {
                // Every return path runs pending defers first.
                self.emit(Inst::DeferRunAll);
                match value {
                    Some(v) => {
                        let operand = self.lower_expr(v)?;
                        let ty = self.fn_ret.clone();
                        self.emit(Inst::Ret {
                            value: Some(operand),
                            ty,
                        });
                    }
                    None => {
                        self.emit(Inst::Ret {
                            value: None,
                            ty: MirType::void(),
                        });
                    }
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => self.lower_if(cond, then_block, else_branch.as_deref()),
            Stmt::While { cond, body, .. } => self.lower_while(cond, body),
            Stmt::For {
                init,
                cond,
                post,
                body,
                ..
            } => self.lower_for_three_part(init, cond, post, body),
            Stmt::ForIn {
                var, iter, body, ..
            } => self.lower_for_range(*var, iter, body),
            Stmt::Break { .. } => {
                let label = match self.loop_stack.last() {
                    Some(frame) => frame.break_label.clone(),
                    None => return Err(internal_error("break outside of a loop in lowering")),
                };
                self.emit(Inst::Br { label });
                Ok(())
            }
            Stmt::Continue { .. } => {
                let label = match self.loop_stack.last() {
                    Some(frame) => frame.continue_label.clone(),
                    None => return Err(internal_error("continue outside of a loop in lowering")),
                };
                self.emit(Inst::Br { label });
                Ok(())
            }
            Stmt::Defer { call, .. } => self.lower_defer(call),
            Stmt::Unsafe { block, .. } | Stmt::BlockStmt { block, .. } => {
                self.lower_block(block)
            }
            Stmt::ExprStmt { expr, .. } => {
                self.lower_expr(expr)?;
                Ok(())
            }
        }
    }

    pub(crate) fn lower_block(&mut self, block: &Block) -> Result<()> {
        for stmt in &block.stmts {
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_assign(
        &mut self,
        target: &Expr,
        op: yar_syntax::ast::AssignOp,
        value: &Expr,
    ) -> Result<()> {
        match target {
            Expr::Ident { name, .. } => {
                let name = self.interner.resolve(*name).to_string();
                let ty = self
                    .var_types
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(MirType::i32);
                let rhs = self.lower_expr(value)?;
                let stored = match op.binary_op() {
                    Some(bop) => {
                        // Compound form: load, combine, store back.
                        let current = self.fresh_temp();
                        self.emit(Inst::Load {
                            dest: current.clone(),
                            src: name.clone(),
                            ty: ty.clone(),
                        });
                        let combined = self.fresh_temp();
                        self.emit(Inst::BinOp {
                            dest: combined.clone(),
                            op: op_kind_of(bop),
                            lhs: current,
                            rhs,
                            ty: ty.clone(),
                        });
                        combined
                    }
                    None => rhs,
                };
                self.emit(Inst::Store {
                    value: stored,
                    dest: name,
                    ty,
                });
                Ok(())
            }
            Expr::Unary {
                op: yar_syntax::ast::UnaryOp::Deref,
                operand,
                ..
            } => {
                let ptr = self.lower_expr(operand)?;
                let ty = match self.infer_expr_type(operand) {
                    MirType::Ptr(inner) => *inner,
                    other => other,
                };
                let rhs = self.lower_expr(value)?;
                self.emit(Inst::Store {
                    value: rhs,
                    dest: ptr,
                    ty,
                });
                Ok(())
            }
            // Field and index targets need aggregate slots, which scalar MIR
            // does not model yet.
            _ => Err(internal_error(
                "assignment target is not lowerable to a named slot",
            )),
        }
    }

    fn lower_if(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        else_branch: Option<&Stmt>,
    ) -> Result<()> {
        let cond_val = self.lower_expr(cond)?;
        let id = self.fresh_label_id();
        let then_label = format!("then{}", id);
        let merge_label = format!("merge{}", id);
        let else_label = if else_branch.is_some() {
            format!("else{}", id)
        } else {
            merge_label.clone()
        };

        self.emit(Inst::CondBr {
            cond: cond_val,
            then_label: then_label.clone(),
            else_label: else_label.clone(),
        });

        self.start_block(then_label);
        self.lower_block(then_block)?;
        if !self.current_terminated() {
            self.emit(Inst::Br {
                label: merge_label.clone(),
            });
        }

        if let Some(else_stmt) = else_branch {
            self.start_block(else_label);
            self.lower_stmt(else_stmt)?;
            if !self.current_terminated() {
                self.emit(Inst::Br {
                    label: merge_label.clone(),
                });
            }
        }

        self.start_block(merge_label);
        Ok(())
    }

    fn lower_while(&mut self, cond: &Expr, body: &Block) -> Result<()> {
        let id = self.fresh_label_id();
        let cond_label = format!("cond{}", id);
        let body_label = format!("body{}", id);
        let exit_label = format!("exit{}", id);

        self.emit(Inst::Br {
            label: cond_label.clone(),
        });

        self.start_block(cond_label.clone());
        let cond_val = self.lower_expr(cond)?;
        self.emit(Inst::CondBr {
            cond: cond_val,
            then_label: body_label.clone(),
            else_label: exit_label.clone(),
        });

        self.start_block(body_label);
        self.loop_stack.push(LoopFrame {
            continue_label: cond_label.clone(),
            break_label: exit_label.clone(),
        });
        self.lower_block(body)?;
        self.loop_stack.pop();
        if !self.current_terminated() {
            self.emit(Inst::Br { label: cond_label });
        }

        self.start_block(exit_label);
        Ok(())
    }

    /// Range form: the loop variable gets a slot, the end bound is evaluated
    /// once before the loop, and the body ends with an implicit increment.
    fn lower_for_range(
        &mut self,
        var: yar_base::Symbol,
        iter: &Expr,
        body: &Block,
    ) -> Result<()> {
        let (start, end) = match iter {
            Expr::Binary {
                op: BinaryOp::Range,
                left,
                right,
                ..
            } => (&**left, &**right),
            _ => {
                return Err(internal_error(
                    "for-in is only lowerable over a range expression",
                ))
            }
        };

        let var_ty = self.infer_expr_type(start);
        let var_name = self.interner.resolve(var).to_string();
        let start_val = self.lower_expr(start)?;
        self.emit(Inst::Alloca {
            name: var_name.clone(),
            ty: var_ty.clone(),
        });
        self.emit(Inst::Store {
            value: start_val,
            dest: var_name.clone(),
            ty: var_ty.clone(),
        });
        self.var_types.insert(var_name.clone(), var_ty.clone());
        let end_val = self.lower_expr(end)?;

        let id = self.fresh_label_id();
        let cond_label = format!("cond{}", id);
        let body_label = format!("body{}", id);
        let exit_label = format!("exit{}", id);

        self.emit(Inst::Br {
            label: cond_label.clone(),
        });

        self.start_block(cond_label.clone());
        let current = self.fresh_temp();
        self.emit(Inst::Load {
            dest: current.clone(),
            src: var_name.clone(),
            ty: var_ty.clone(),
        });
        let cmp = self.fresh_temp();
        self.emit(Inst::BinOp {
            dest: cmp.clone(),
            op: OpKind::Lt,
            lhs: current,
            rhs: end_val,
            ty: var_ty.clone(),
        });
        self.emit(Inst::CondBr {
            cond: cmp,
            then_label: body_label.clone(),
            else_label: exit_label.clone(),
        });

        self.start_block(body_label);
        self.loop_stack.push(LoopFrame {
            continue_label: cond_label.clone(),
            break_label: exit_label.clone(),
        });
        self.lower_block(body)?;
        self.loop_stack.pop();
        if !self.current_terminated() {
            let before = self.fresh_temp();
            self.emit(Inst::Load {
                dest: before.clone(),
                src: var_name.clone(),
                ty: var_ty.clone(),
            });
            let after = self.fresh_temp();
            self.emit(Inst::BinOp {
                dest: after.clone(),
                op: OpKind::Add,
                lhs: before,
                rhs: "1".to_string(),
                ty: var_ty.clone(),
            });
            self.emit(Inst::Store {
                value: after,
                dest: var_name,
                ty: var_ty,
            });
            self.emit(Inst::Br { label: cond_label });
        }

        self.start_block(exit_label);
        Ok(())
    }

    fn lower_for_three_part(
        &mut self,
        init: &Stmt,
        cond: &Expr,
        post: &Stmt,
        body: &Block,
    ) -> Result<()> {
        self.lower_stmt(init)?;

        let id = self.fresh_label_id();
        let cond_label = format!("cond{}", id);
        let body_label = format!("body{}", id);
        let exit_label = format!("exit{}", id);

        self.emit(Inst::Br {
            label: cond_label.clone(),
        });

        self.start_block(cond_label.clone());
        let cond_val = self.lower_expr(cond)?;
        self.emit(Inst::CondBr {
            cond: cond_val,
            then_label: body_label.clone(),
            else_label: exit_label.clone(),
        });

        self.start_block(body_label);
        self.loop_stack.push(LoopFrame {
            continue_label: cond_label.clone(),
            break_label: exit_label.clone(),
        });
        self.lower_block(body)?;
        self.loop_stack.pop();
        if !self.current_terminated() {
            self.lower_stmt(post)?;
            self.emit(Inst::Br { label: cond_label });
        }

        self.start_block(exit_label);
        Ok(())
    }

    /// `defer call(...)` prepares the call (arguments evaluated now) and
    /// pushes it; `defer-run-all` before each return replays the pushes.
    fn lower_defer(&mut self, call: &Expr) -> Result<()> {
        let (callee, args) = match call {
            Expr::Call { callee, args, .. } => (callee, args),
            _ => return Err(internal_error("defer requires a call expression")),
        };
        let name = match super::callee_name(self.interner, callee) {
            Some(name) => name,
            None => return Err(internal_error("defer callee must be a function name")),
        };
        let mut lowered_args = Vec::new();
        for arg in args {
            lowered_args.push(self.lower_expr(arg)?);
        }
        let prepared = Inst::Call {
            dest: None,
            callee: name,
            args: lowered_args,
            ret: MirType::void(),
        };
        self.emit(Inst::DeferPush {
            call: Box::new(prepared),
        });
        Ok(())
    }
}

fn op_kind_of(op: BinaryOp) -> OpKind {
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
