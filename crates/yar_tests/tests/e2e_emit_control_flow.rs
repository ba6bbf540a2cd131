//! Emitted-IR properties for control flow, defers, and `?`.

mod common;

use common::{emit_ok, function_body};

#[test]
fn while_loop_emits_four_blocks() {
    let ir = emit_ok("fn main() { let mut x: i32 = 0\nwhile x < 10 { x = x + 1 } }");
    let body = function_body(&ir, "main");

    for label in ["entry:", "cond0:", "body0:", "exit0:"] {
        assert!(body.contains(label), "missing {} in:\n{}", label, body);
    }

    // cond ends in a conditional branch, body loops back, exit returns.
    let cond = block_text(&body, "cond0");
    assert!(cond.trim_end().ends_with("label %exit0"));
    assert!(cond.contains("br i1"));
    let loop_body = block_text(&body, "body0");
    assert!(loop_body.trim_end().ends_with("br label %cond0"));
    let exit = block_text(&body, "exit0");
    assert!(exit.contains("ret void"));
}

#[test]
fn range_for_compares_against_hoisted_bound() {
    let ir = emit_ok("fn main() { for i in 0..3 { println(i) } }");
    let body = function_body(&ir, "main");

    for label in ["cond0:", "body0:", "exit0:"] {
        assert!(body.contains(label), "missing {}", label);
    }
    let cond = block_text(&body, "cond0");
    assert!(cond.contains("icmp slt i32"));
    assert!(cond.contains(", 3"));

    // The body prints and increments before looping.
    let loop_body = block_text(&body, "body0");
    assert!(loop_body.contains("call void @println_i32"));
    assert!(loop_body.contains("= add i32"));
    assert!(loop_body.trim_end().ends_with("br label %cond0"));
}

#[test]
fn if_else_merges_control_flow() {
    let ir = emit_ok(
        "fn main() { let x = 1\nif x == 1 { println(1) } else { println(2) } }",
    );
    let body = function_body(&ir, "main");
    for label in ["then0:", "else0:", "merge0:"] {
        assert!(body.contains(label), "missing {}", label);
    }
    let then = block_text(&body, "then0");
    assert!(then.trim_end().ends_with("br label %merge0"));
    let els = block_text(&body, "else0");
    assert!(els.trim_end().ends_with("br label %merge0"));
}

#[test]
fn defers_render_as_comments_in_order() {
    let ir = emit_ok(
        "fn main() {\n\
           defer println(1)\n\
           defer println(2)\n\
         }",
    );
    let body = function_body(&ir, "main");
    let first = body.find("; defer push: call @println(1)").unwrap();
    let second = body.find("; defer push: call @println(2)").unwrap();
    let run_all = body.find("; defer run-all").unwrap();
    assert!(first < second);
    assert!(second < run_all);
    assert!(body.trim_end().ends_with("ret void\n}"));
}

#[test]
fn every_return_path_runs_defers() {
    let ir = emit_ok(
        "fn f(x i32) i32 {\n\
           defer println(0)\n\
           if x > 0 { return 1 }\n\
           return 2\n\
         }",
    );
    let body = function_body(&ir, "f");
    let runs = body.matches("; defer run-all").count();
    assert_eq!(runs, 2, "one defer-run-all per return path:\n{}", body);
}

#[test]
fn try_operator_keeps_three_block_shape() {
    let ir = emit_ok("fn get() i32 { return 7 }\nfn main() i32 { return get()? }");
    let body = function_body(&ir, "main");
    for label in ["check0:", "error0:", "ok0:"] {
        assert!(body.contains(label), "missing {} in:\n{}", label, body);
    }
    // The placeholder predicate self-compares and takes the ok edge.
    let check = block_text(&body, "check0");
    assert!(check.contains("icmp eq"));
    assert!(check.contains("label %ok0, label %error0"));
    let error = block_text(&body, "error0");
    assert!(error.contains("; defer run-all"));
    assert!(error.contains("ret i32"));
}

#[test]
fn nested_loops_break_to_their_own_exits() {
    let ir = emit_ok(
        "fn main() {\n\
           for i in 0..3 {\n\
             for j in 0..3 {\n\
               if j == 2 { break }\n\
             }\n\
           }\n\
         }",
    );
    let body = function_body(&ir, "main");
    // The inner break jumps to the inner exit, not the outer one.
    let then_block = block_text(&body, "then2");
    assert!(then_block.trim_end().ends_with("br label %exit1"));
}

/// The instruction lines of one labelled block: everything indented after
/// the label, up to the next label or the closing brace.
fn block_text(body: &str, label: &str) -> String {
    let start = body
        .find(&format!("{}:", label))
        .unwrap_or_else(|| panic!("label {} not found in:\n{}", label, body));
    body[start..]
        .lines()
        .skip(1)
        .take_while(|l| l.starts_with("  "))
        .map(|l| format!("{}\n", l))
        .collect()
}
