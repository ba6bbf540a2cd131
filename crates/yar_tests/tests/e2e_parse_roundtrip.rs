//! Reparsing the printed form of a parsed module is a fixpoint.

mod common;

use common::parse_ok;
use yar_syntax::ast::Printer;

fn roundtrip(source: &str) {
    let (module, interner) = parse_ok(source);
    let printed = Printer::new(&interner).module(&module);

    let (module2, interner2) = parse_ok(&printed);
    let printed2 = Printer::new(&interner2).module(&module2);

    assert_eq!(printed, printed2, "printing is not a fixpoint for:\n{}", source);
}

#[test]
fn functions_round_trip() {
    roundtrip("fn add(a i32, b i32) i32 { return a + b }");
    roundtrip("pub fn fill<T>(mut buf [u8], x T) { }");
    roundtrip("fn main() { println(\"hello\") }");
}

#[test]
fn statements_round_trip() {
    roundtrip(
        "fn main() {\n\
           let mut x: i32 = 0\n\
           while x < 10 { x += 1 }\n\
           for i in 0..3 { println(i) }\n\
           for j := 0; j < 4; j += 1 { continue }\n\
           if x == 10 { return } else if x > 10 { panic(\"high\") } else { }\n\
           defer println(x)\n\
           unsafe { y := 1 }\n\
         }",
    );
}

#[test]
fn declarations_round_trip() {
    roundtrip("struct P { x: i32, y: i32 }");
    roundtrip("enum Shape { Dot, Rect(i32, i32) }");
    roundtrip("trait Area { fn area(&self) -> i32 }");
    roundtrip("impl Area for P { fn area(&self) -> i32 { return 0 } }");
    roundtrip("type Bytes = [u8]");
    roundtrip("const LIMIT: i32 = 0xFF");
    roundtrip("use \"./util.yar\"\nuse m = \"std:fmt\"\nfn main() { }");
}

#[test]
fn expression_shapes_round_trip() {
    roundtrip("fn main() { let a = (1 + 2) * 3 - -4 }");
    roundtrip("fn main() { let t = (1, true) }");
    roundtrip("fn main() { let xs = [1, 2, 3] }");
    roundtrip("struct P { x: i32 }\nfn main() { let p = P{x: 1}\nlet v = p.x }");
    roundtrip("fn main() { let m = &mut [1, 2][0] }");
}

#[test]
fn module_header_round_trips() {
    roundtrip("module math\nfn Square(x i32) i32 { return x * x }");
}
