//! The optimizer and the fixed module pass pipeline.

mod common;

use common::{compile_module, function, raw_ir};
use occ::backend::ssa::{InstKind, SsaBackend};
use occ::backend::{Backend, IntBinOp, PASS_PIPELINE};
use occ::CodeGenError;

fn optimized_ir(src: &str) -> String {
    match compile_module(src, true) {
        Ok(module) => module.to_string(),
        Err(err) => panic!("compilation failed: {err}\n{src}"),
    }
}

#[test]
fn pipeline_order_is_fixed() {
    assert_eq!(PASS_PIPELINE, ["tailcallelim", "mem2reg", "gvn", "instcombine", "early-cse"]);
}

#[test]
fn constants_fold_through_promoted_slots() {
    let src = "
func main() -> int {
    let x: int -> 2 + 3
    return x * 1
}
";
    let ir = optimized_ir(src);
    assert!(ir.contains("ret i32 5"), "{ir}");
    assert!(!ir.contains("alloca"), "{ir}");

    let raw = raw_ir(src);
    assert!(raw.contains("add i32 2, 3"), "{raw}");
    assert!(raw.contains("%x = alloca i32"), "{raw}");
}

#[test]
fn returned_calls_are_marked_tail() {
    let src = "
func g() -> int {
    return 1
}

func f() -> int {
    return g()
}
";
    let ir = optimized_ir(src);
    assert!(ir.contains("tail call i32 @g()"), "{ir}");
    assert!(!raw_ir(src).contains("tail call"));
}

#[test]
fn calls_reading_the_callers_frame_are_not_tail() {
    let src = "
Point -> struct { x: int, y: int }

func get(p: Point*) -> int {
    return p -> x
}

func main() -> int {
    let p: Point -> [Point]{1, 2}
    return get(&p)
}
";
    let ir = optimized_ir(src);
    assert!(ir.contains("call i32 @get(ptr %struct_PointInstance)"), "{ir}");
    assert!(!ir.contains("tail call i32 @get"), "{ir}");
}

#[test]
fn member_addresses_passed_to_calls_block_tail_marking() {
    let src = "
Point -> struct { x: int, y: int }

func read(n: int*) -> int {
    return 0
}

func main() -> int {
    let p: Point -> [Point]{1, 2}
    return read(&p -> y)
}
";
    let ir = optimized_ir(src);
    assert!(!ir.contains("tail call"), "{ir}");
}

#[test]
fn repeated_arithmetic_is_numbered_once() {
    let src = "
func f(a: int) -> int {
    let x: int -> a + a
    let y: int -> a + a
    return x - y
}
";
    let module = compile_module(src, true).expect("compiles");
    let f = function(&module, "f");
    let adds = f
        .instructions()
        .filter(|inst| matches!(inst.kind, InstKind::Binary { op: IntBinOp::Add, .. }))
        .count();
    assert_eq!(adds, 1, "{module}");
    assert!(!f.instructions().any(|inst| matches!(inst.kind, InstKind::Load { .. })));
}

#[test]
fn struct_slots_survive_optimization() {
    let ir = optimized_ir(
        "
Point -> struct { x: int, y: int }

func main() -> int {
    let p: Point -> [Point]{1, 2}
    return p -> y
}
",
    );
    assert!(ir.contains("alloca %Point"), "{ir}");
    assert!(ir.contains("getelementptr inbounds %Point"), "{ir}");
}

#[test]
fn unknown_pass_is_a_backend_error() {
    let mut backend = SsaBackend::new("passes");
    let err = backend.run_pass("bogus").expect_err("no such pass");
    assert!(matches!(err, CodeGenError::Backend { .. }), "{err:?}");
    assert!(err.to_string().contains("unknown pass `bogus`"), "{err}");
}
