//! The compilation pipeline.
//!
//! ```text
//! source text
//!      │
//!      ▼
//! ┌─────────┐    ┌───────────┐    ┌──────────────┐
//! │  Parser │ ─▶ │  Checker  │ ─▶ │ MIR lowerer  │ ─▶ LLVM IR text
//! └─────────┘    └───────────┘    └──────────────┘
//! ```
//!
//! The file-based entry points wrap the [`Loader`], so imports resolve and
//! cross-module export validation runs before anything lowers.
//!
//! | Function | Input | Produces |
//! |----------|-------|----------|
//! | [`parse_source`] | source text | AST |
//! | [`check_source`] | source text | `()` or accumulated errors |
//! | [`check_file`] | entry path | multi-module check |
//! | [`emit_source`] | source text | LLVM IR text |
//! | [`emit_file`] | entry path | LLVM IR text for the entry module |

use std::fmt;
use std::path::Path;

use yar_base::{Diagnostic, Interner};
use yar_syntax::ast;
use yar_syntax::{ParseError, Parser};

use crate::analysis::{CheckError, Checker};
use crate::llvm;
use crate::loader::{LoadError, Loader};
use crate::lower;

// ANSI styling for the two spots the report colors: the failure header and
// the success confirmation. Everything else prints plain so `file:line:`
// prefixes stay grep-able.
const BOLD_RED: &str = "\x1b[1;31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

fn paint(code: &str, text: &str) -> String {
    format!("{}{}{}", code, text, RESET)
}

/// Everything that can stop a compile, with the phase it came from.
#[derive(Debug)]
pub enum CompileError {
    Parse(Vec<ParseError>),
    Check(Vec<CheckError>),
    Load(LoadError),
    /// Internal invariant violation in the lowerer; reaching this means a
    /// checker bug.
    Lower(Diagnostic),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Parse(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            CompileError::Check(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            CompileError::Load(err) => write!(f, "{}", err),
            CompileError::Lower(err) => write!(f, "internal error: {}", err),
        }
    }
}

impl std::error::Error for CompileError {}

/// Parses source text into a module, failing if any syntax error was
/// recorded.
pub fn parse_source(source: &str, interner: &mut Interner) -> Result<ast::Module, CompileError> {
    let mut parser = Parser::new(source, interner);
    let module = parser.parse_module();
    let errors = std::mem::take(&mut parser.errors);
    if errors.is_empty() {
        Ok(module)
    } else {
        Err(CompileError::Parse(errors))
    }
}

/// Parses and checks a single in-memory module.
pub fn check_source(source: &str) -> Result<(), CompileError> {
    let mut interner = Interner::new();
    let module = parse_source(source, &mut interner)?;
    let mut checker = Checker::new(&mut interner);
    checker.check_module(&module).map_err(CompileError::Check)
}

/// Loads the entry file with its imports and checks the whole project.
pub fn check_file(path: &Path) -> Result<(), CompileError> {
    let mut loader = Loader::new();
    loader.load_entry(path).map_err(CompileError::Load)?;
    loader.check_project().map_err(CompileError::Check)
}

/// Parses, checks, lowers, and emits a single in-memory module.
pub fn emit_source(source: &str) -> Result<String, CompileError> {
    let mut interner = Interner::new();
    let module = parse_source(source, &mut interner)?;
    let mut checker = Checker::new(&mut interner);
    checker.check_module(&module).map_err(CompileError::Check)?;
    let mir = lower::lower_module(&interner, &module).map_err(CompileError::Lower)?;
    Ok(llvm::emit_module(&mir))
}

/// Loads and checks a project, then emits LLVM IR for the entry module.
pub fn emit_file(path: &Path) -> Result<String, CompileError> {
    let mut loader = Loader::new();
    let entry = loader.load_entry(path).map_err(CompileError::Load)?;
    loader.check_project().map_err(CompileError::Check)?;
    let module = loader.module(entry);
    let mir =
        lower::lower_module(&loader.interner, &module.ast).map_err(CompileError::Lower)?;
    Ok(llvm::emit_module(&mir))
}

/// Renders an error report the way the CLI prints it: a bold red header and
/// one `file:line: message` line per error.
pub fn render_errors(file: &str, error: &CompileError) -> String {
    let mut out = String::new();
    out.push_str(&paint(BOLD_RED, "error"));
    out.push_str(": compilation failed\n");
    match error {
        CompileError::Parse(errors) => {
            for err in errors {
                out.push_str(&format!("{}:{}: {}\n", file, err.line(), err.kind));
            }
        }
        CompileError::Check(errors) => {
            for err in errors {
                out.push_str(&format!("{}:{}: {}\n", file, err.line(), err.message));
            }
        }
        CompileError::Load(err) => {
            out.push_str(&format!("{}\n", err));
        }
        CompileError::Lower(err) => {
            out.push_str(&format!("{}: internal error: {}\n", file, err.message));
        }
    }
    out
}

/// The single confirmation line a successful check prints.
pub fn render_success(file: &str) -> String {
    format!("{}: {}", file, paint(GREEN, "ok"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_source_accepts_valid_programs() {
        assert!(check_source("fn main() { println(\"hello\") }").is_ok());
    }

    #[test]
    fn check_source_reports_parse_errors() {
        let err = check_source("fn main( {").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn check_source_reports_check_errors() {
        let err = check_source("fn main() { let x = y }").unwrap_err();
        match err {
            CompileError::Check(errors) => {
                assert!(errors[0].message.contains("undefined name"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn emit_source_produces_llvm_ir() {
        let ir = emit_source("fn main() { println(\"hello\") }").unwrap();
        assert!(ir.contains("define void @main()"));
        assert!(ir.contains("c\"hello\\00\""));
    }

    #[test]
    fn error_report_carries_file_and_line() {
        let err = check_source("fn main() {\n  let x = y\n}").unwrap_err();
        let report = render_errors("main.yar", &err);
        assert!(report.contains("main.yar:2: undefined name 'y'"));
        // The header is the only colored part of the failure report.
        assert!(report.starts_with("\x1b[1;31merror\x1b[0m"));
    }

    #[test]
    fn success_report_is_one_styled_line() {
        let line = render_success("main.yar");
        assert!(line.starts_with("main.yar: "));
        assert!(line.contains("\x1b[32mok\x1b[0m"));
        assert!(!line.contains('\n'));
    }
}
