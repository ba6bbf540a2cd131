//! # yar-compile
//!
//! The back half of the yar compiler: everything between a parsed module and
//! LLVM IR text.
//!
//! ```text
//! ast::Module
//!      │
//!      ▼
//! ┌───────────────────┐
//! │ analysis::Checker │  types, moves, borrows, arity
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │   lower (MIR)     │  basic blocks, named temporaries
//! └─────────┬─────────┘
//!           ▼
//! ┌───────────────────┐
//! │   llvm (emit)     │  textual LLVM module
//! └───────────────────┘
//! ```
//!
//! Multi-module input goes through [`loader::Loader`], which resolves
//! imports, orders dependencies, and validates cross-module exports. The
//! [`compile`] module ties the phases into the `parse`/`check`/`emit`
//! entry points the CLI consumes.
//!
//! ## Example
//!
//! ```
//! use yar_compile::compile::emit_source;
//!
//! let ir = emit_source("fn main() { println(\"hello\") }").unwrap();
//! assert!(ir.contains("@println"));
//! ```

pub mod analysis;
pub mod compile;
pub mod llvm;
pub mod loader;
pub mod lower;
pub mod manifest;
pub mod mir;

pub use analysis::{CheckError, Checker, TypeEnv, YarType};
pub use compile::{
    check_file, check_source, emit_file, emit_source, parse_source, render_errors,
    render_success, CompileError,
};
pub use loader::{LoadError, Loader, Module};
pub use manifest::{find_project_root, Manifest};
pub use mir::{BasicBlock, Inst, MirFunction, MirModule, MirType, OpKind};
