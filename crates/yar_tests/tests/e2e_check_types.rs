//! Type-checker behavior over whole programs.

mod common;

use common::{check_errors, check_ok};

#[test]
fn arithmetic_and_calls_check() {
    check_ok(
        "fn add(a i32, b i32) i32 { return a + b }\n\
         fn main() { let s = add(2, 3)\nprintln(s) }",
    );
}

#[test]
fn annotation_vs_inferred_mismatch() {
    let errors = check_errors("fn main() { let x: bool = 5 }");
    assert!(errors[0].contains("declared bool but initializer has i32"));
}

#[test]
fn binary_operand_disagreement() {
    let errors = check_errors("fn main() { let x = 1 + true }");
    assert!(errors
        .iter()
        .any(|e| e.contains("requires matching operand types")));
}

#[test]
fn wrong_arity_still_checks_arguments() {
    let errors = check_errors(
        "fn f(a i32, b i32) { }\n\
         fn main() { f(true) }",
    );
    // Both the arity error and the argument type error surface.
    assert!(errors.iter().any(|e| e.contains("wrong number of arguments")));
    assert!(errors.iter().any(|e| e.contains("argument 1")));
}

#[test]
fn undefined_names_and_types() {
    let errors = check_errors("fn main() { let x: Widget = y }");
    assert!(errors.iter().any(|e| e.contains("unknown type 'Widget'")));
    assert!(errors.iter().any(|e| e.contains("undefined name 'y'")));
}

#[test]
fn array_length_validation() {
    let errors = check_errors("fn f(x [i32; 0]) { }");
    assert!(errors.iter().any(|e| e.contains("array length must be positive")));
    check_ok("fn f(x [i32; 0b100]) { }");
    check_ok("fn f(x [i32; 1_000]) { }");
}

#[test]
fn malformed_type_path() {
    let errors = check_errors("fn f(x a::b::c) { }");
    assert!(errors.iter().any(|e| e.contains("malformed type path")));
}

#[test]
fn references_and_derefs() {
    check_ok(
        "fn main() { let x = 5\nlet r = &x\nlet y: i32 = *r }",
    );
    let errors = check_errors("fn main() { let x = 5\nlet y = *x }");
    assert!(errors.iter().any(|e| e.contains("cannot dereference i32")));
}

#[test]
fn struct_field_types_flow() {
    check_ok(
        "struct P { x: i32, y: i32 }\n\
         fn dist(p P) i32 { return p.x + p.y }\n\
         fn main() { let p = P{x: 3, y: 4}\nprintln(dist(p)) }",
    );
    let errors = check_errors(
        "struct P { x: i32 }\n\
         fn main() { let p = P{x: true} }",
    );
    assert!(errors.iter().any(|e| e.contains("field 'x' has type bool")));
}

#[test]
fn enums_register_as_nominals() {
    check_ok("enum Shape { Dot, Rect(i32, i32) }\nfn f(s Shape) { }\nfn main() { }");
}

#[test]
fn type_alias_resolves() {
    check_ok("type Bytes = [u8]\nfn f(b Bytes) usize { return len(b) }");
}

#[test]
fn len_returns_usize_and_panic_takes_bytes() {
    check_ok("fn f(b [u8]) { let n: usize = len(b)\npanic(\"boom\") }");
}

#[test]
fn errors_accumulate_across_statements() {
    let errors = check_errors(
        "fn main() {\n\
           let a = missing1\n\
           let b: bool = 2\n\
           let c = missing2\n\
         }",
    );
    assert!(errors.len() >= 3, "expected at least 3 errors, got {:?}", errors);
}
