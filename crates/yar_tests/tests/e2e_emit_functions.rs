//! Emitted-IR properties for functions, calls, and string constants.

mod common;

use common::{emit_ok, function_body};

#[test]
fn hello_world_emits_constant_gep_and_call() {
    let ir = emit_ok("fn main() { println(\"hello\") }");

    // Exactly one private constant with the content and a trailing NUL.
    let constants: Vec<&str> = ir
        .lines()
        .filter(|l| l.contains("private unnamed_addr constant"))
        .collect();
    assert_eq!(constants.len(), 1);
    assert!(constants[0].contains("[6 x i8] c\"hello\\00\""));

    // main is void with a single block ending in ret void.
    let body = function_body(&ir, "main");
    assert!(ir.contains("define void @main()"));
    assert!(body.contains("getelementptr inbounds [6 x i8], [6 x i8]* @str.0, i32 0, i32 0"));
    assert!(body.contains("call void @println(i8*"));
    assert!(body.trim_end().ends_with("ret void\n}"));

    assert!(ir.contains("declare void @println(i8*)"));
}

#[test]
fn parameters_spill_to_named_addr_slots() {
    let ir = emit_ok("fn add(a i32, b i32) i32 { return a + b }");
    let body = function_body(&ir, "add");
    assert!(ir.contains("define i32 @add(i32 %a, i32 %b)"));
    assert!(body.contains("%a.addr = alloca i32"));
    assert!(body.contains("store i32 %a, i32* %a.addr"));
    assert!(body.contains("%b.addr = alloca i32"));
    assert!(body.contains("store i32 %b, i32* %b.addr"));

    // The body loads both parameters, adds, and returns the sum.
    assert!(body.contains("load i32, i32* %a.addr"));
    assert!(body.contains("load i32, i32* %b.addr"));
    assert!(body.contains("= add i32"));
    assert!(body.contains("ret i32 %"));
}

#[test]
fn empty_function_is_one_block_ending_ret_void() {
    let ir = emit_ok("fn noop() { }");
    let body = function_body(&ir, "noop");
    assert_eq!(body.matches(':').count(), 1, "expected a single entry label");
    assert!(body.contains("entry:"));
    assert!(body.trim_end().ends_with("ret void\n}"));
}

#[test]
fn each_string_use_gets_its_own_gep() {
    let ir = emit_ok(
        "fn main() { println(\"a\")\nprintln(\"b\")\nprintln(\"a\") }",
    );
    // Three literals intern three globals (interning is per occurrence).
    let constants = ir
        .lines()
        .filter(|l| l.contains("private unnamed_addr constant"))
        .count();
    assert_eq!(constants, 3);
    let geps = ir.matches("getelementptr inbounds").count();
    assert_eq!(geps, 3);
}

#[test]
fn println_dispatch_covers_strings_ints_and_bools() {
    let ir = emit_ok(
        "fn main() {\n\
           println(\"s\")\n\
           println(42)\n\
           let b = true\n\
           println(b)\n\
         }",
    );
    assert!(ir.contains("call void @println(i8*"));
    assert!(ir.contains("call void @println_i32(i32 42)"));
    assert!(ir.contains("call void @println_bool(i1 %"));
    assert!(ir.contains("declare void @println(i8*)"));
    assert!(ir.contains("declare void @println_i32(i32)"));
    assert!(ir.contains("declare void @println_bool(i1)"));
}

#[test]
fn calls_between_functions_use_known_signatures() {
    let ir = emit_ok(
        "fn double(x i32) i32 { return x * 2 }\n\
         fn main() { println(double(21)) }",
    );
    assert!(ir.contains("call i32 @double(i32 21)"));
    // Known functions are defined, not declared.
    assert!(!ir.contains("declare i32 @double"));
}

#[test]
fn signed_semantics_are_the_integer_defaults() {
    let ir = emit_ok(
        "fn f(a i32, b i32) i32 { return a / b }\n\
         fn g(a i32, b i32) i32 { return a % b }\n\
         fn h(a i32) i32 { return a >> 1 }",
    );
    assert!(ir.contains("sdiv i32"));
    assert!(ir.contains("srem i32"));
    assert!(ir.contains("ashr i32"));
}

#[test]
fn float_arithmetic_uses_fp_opcodes() {
    let ir = emit_ok("fn f(a f64, b f64) f64 { return a + b }");
    assert!(ir.contains("define double @f(double %a, double %b)"));
    assert!(ir.contains("fadd double"));
}
