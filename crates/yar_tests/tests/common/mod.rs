//! Shared helpers for the end-to-end suites.

use yar_base::Interner;
use yar_compile::compile::{check_source, emit_source, CompileError};
use yar_syntax::ast::Module;
use yar_syntax::Parser;

/// Parses source that must be syntactically valid.
#[allow(dead_code)]
pub fn parse_ok(source: &str) -> (Module, Interner) {
    let mut interner = Interner::new();
    let mut parser = Parser::new(source, &mut interner);
    let module = parser.parse_module();
    assert!(parser.errors.is_empty(), "parse errors: {:?}", parser.errors);
    drop(parser);
    (module, interner)
}

/// Checks source that must be well-typed.
#[allow(dead_code)]
pub fn check_ok(source: &str) {
    if let Err(err) = check_source(source) {
        panic!("expected clean check, got:\n{}", err);
    }
}

/// Checks source that must fail, returning the rendered error messages.
#[allow(dead_code)]
pub fn check_errors(source: &str) -> Vec<String> {
    match check_source(source) {
        Ok(()) => panic!("expected check errors, got none"),
        Err(CompileError::Check(errors)) => errors.iter().map(|e| e.to_string()).collect(),
        Err(other) => panic!("expected check errors, got: {}", other),
    }
}

/// Emits LLVM IR for source that must compile cleanly.
#[allow(dead_code)]
pub fn emit_ok(source: &str) -> String {
    match emit_source(source) {
        Ok(ir) => ir,
        Err(err) => panic!("expected successful emit, got:\n{}", err),
    }
}

/// The body text of one emitted function, from `define ... @name` to the
/// closing brace.
#[allow(dead_code)]
pub fn function_body(ir: &str, name: &str) -> String {
    let needle = format!("@{}(", name);
    let start = ir
        .find(&needle)
        .unwrap_or_else(|| panic!("function {} not in:\n{}", name, ir));
    let rest = &ir[start..];
    let end = rest.find("\n}").map(|i| i + 2).unwrap_or(rest.len());
    rest[..end].to_string()
}
