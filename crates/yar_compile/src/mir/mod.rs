//! Mid-level IR: labelled basic blocks of SSA-style instructions.
//!
//! MIR sits between the typed AST and LLVM IR. Operands are plain string
//! tokens: a name refers to a local or temporary, a decimal spelling is an
//! immediate, and an `@`-prefixed token references a global (an interned
//! string constant the emitter materializes through a GEP).
//!
//! A block is well-formed iff it ends with exactly one terminator (branch,
//! conditional branch, or return). The first block of a function is its
//! entry.

use std::fmt;

/// A MIR type: a primitive named with its LLVM spelling, or a pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirType {
    Prim(String),
    Ptr(Box<MirType>),
}

impl MirType {
    pub fn prim(name: &str) -> MirType {
        MirType::Prim(name.to_string())
    }

    pub fn ptr(inner: MirType) -> MirType {
        MirType::Ptr(Box::new(inner))
    }

    pub fn void() -> MirType {
        MirType::prim("void")
    }

    pub fn i32() -> MirType {
        MirType::prim("i32")
    }

    pub fn i1() -> MirType {
        MirType::prim("i1")
    }

    /// Byte pointer, the type of string constants at use sites.
    pub fn byte_ptr() -> MirType {
        MirType::ptr(MirType::prim("i8"))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, MirType::Prim(name) if name == "void")
    }
}

impl fmt::Display for MirType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirType::Prim(name) => write!(f, "{}", name),
            MirType::Ptr(inner) => write!(f, "{}*", inner),
        }
    }
}

/// Binary operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl OpKind {
    /// Comparisons produce an `i1` regardless of operand type.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            OpKind::Eq | OpKind::Ne | OpKind::Lt | OpKind::Le | OpKind::Gt | OpKind::Ge
        )
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpKind::Add => "add",
            OpKind::Sub => "sub",
            OpKind::Mul => "mul",
            OpKind::Div => "div",
            OpKind::Rem => "rem",
            OpKind::And => "and",
            OpKind::Or => "or",
            OpKind::Xor => "xor",
            OpKind::Shl => "shl",
            OpKind::Shr => "shr",
            OpKind::Eq => "eq",
            OpKind::Ne => "ne",
            OpKind::Lt => "lt",
            OpKind::Le => "le",
            OpKind::Gt => "gt",
            OpKind::Ge => "ge",
        }
    }
}

/// One MIR instruction.
#[derive(Debug, Clone)]
pub enum Inst {
    /// Stack slot named after the source binding.
    Alloca {
        name: String,
        ty: MirType,
    },
    Load {
        dest: String,
        src: String,
        ty: MirType,
    },
    Store {
        value: String,
        dest: String,
        ty: MirType,
    },
    BinOp {
        dest: String,
        op: OpKind,
        lhs: String,
        rhs: String,
        ty: MirType,
    },
    Call {
        dest: Option<String>,
        callee: String,
        args: Vec<String>,
        ret: MirType,
    },
    Br {
        label: String,
    },
    CondBr {
        cond: String,
        then_label: String,
        else_label: String,
    },
    Ret {
        value: Option<String>,
        ty: MirType,
    },
    /// Registers a call to run at function exit. Emitted as a comment until
    /// a runtime defer stack exists.
    DeferPush {
        call: Box<Inst>,
    },
    /// Runs the registered defers. Precedes every return.
    DeferRunAll,
}

impl Inst {
    /// Whether this instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Br { .. } | Inst::CondBr { .. } | Inst::Ret { .. })
    }
}

/// A labelled straight-line instruction sequence.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub insts: Vec<Inst>,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            insts: Vec::new(),
        }
    }

    /// True iff the block ends with exactly one terminator.
    pub fn is_terminated(&self) -> bool {
        self.insts.last().is_some_and(Inst::is_terminator)
    }
}

/// An interned string constant.
#[derive(Debug, Clone)]
pub struct GlobalString {
    /// Synthetic name, referenced as `@name` in operands.
    pub name: String,
    /// Raw (decoded) content, without a trailing NUL.
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct MirFunction {
    pub name: String,
    pub params: Vec<(String, MirType)>,
    pub ret: MirType,
    /// Blocks in insertion order; the first is the entry.
    pub blocks: Vec<BasicBlock>,
}

/// Globals in insertion order, then functions in insertion order.
#[derive(Debug, Default)]
pub struct MirModule {
    pub globals: Vec<GlobalString>,
    pub functions: Vec<MirFunction>,
}

impl MirModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn function(&self, name: &str) -> Option<&MirFunction> {
        self.functions.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Alloca { name, ty } => write!(f, "{} = alloca {}", name, ty),
            Inst::Load { dest, src, ty } => write!(f, "{} = load {} {}", dest, ty, src),
            Inst::Store { value, dest, ty } => write!(f, "store {} {} -> {}", ty, value, dest),
            Inst::BinOp {
                dest,
                op,
                lhs,
                rhs,
                ty,
            } => write!(f, "{} = {} {} {}, {}", dest, op.mnemonic(), ty, lhs, rhs),
            Inst::Call {
                dest,
                callee,
                args,
                ret,
            } => {
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                write!(f, "call {} {}({})", ret, callee, args.join(", "))
            }
            Inst::Br { label } => write!(f, "br {}", label),
            Inst::CondBr {
                cond,
                then_label,
                else_label,
            } => write!(f, "condbr {}, {}, {}", cond, then_label, else_label),
            Inst::Ret { value, ty } => match value {
                Some(value) => write!(f, "ret {} {}", ty, value),
                None => write!(f, "ret void"),
            },
            Inst::DeferPush { call } => write!(f, "defer-push {{{}}}", call),
            Inst::DeferRunAll => write!(f, "defer-run-all"),
        }
    }
}

impl fmt::Display for MirFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(name, ty)| format!("{} {}", name, ty))
            .collect();
        writeln!(f, "fn {}({}) -> {}", self.name, params.join(", "), self.ret)?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label)?;
            for inst in &block.insts {
                writeln!(f, "  {}", inst)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for MirModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for global in &self.globals {
            writeln!(f, "global {} = {:?}", global.name, global.value)?;
        }
        for function in &self.functions {
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}
