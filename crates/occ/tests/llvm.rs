//! The codegen and pass scenarios run again through inkwell.

#![cfg(feature = "llvm")]

use inkwell::context::Context;
use inkwell::values::InstructionOpcode;
use occ::backend::Backend;
use occ::backend::llvm::LlvmBackend;
use occ::codegen::CodeGenOptions;
use occ::{BackendKind, CodeGenError};

/// Compiles `src` into a fresh LLVM module and hands the backend to `check`.
fn with_backend<T>(src: &str, optimize: bool, check: impl FnOnce(&mut LlvmBackend<'_>) -> T) -> T {
    let _guard = occ::diagnostics::suppress();
    let context = Context::create();
    let backend = match LlvmBackend::new(&context, "test") {
        Ok(backend) => backend,
        Err(err) => panic!("no native target: {err}"),
    };
    match occ::compile_source(src, backend, CodeGenOptions { optimize }) {
        Ok(mut compilation) => check(&mut compilation.backend),
        Err(err) => panic!("compilation failed: {err}\n{src}"),
    }
}

fn ir(src: &str, optimize: bool) -> String {
    with_backend(src, optimize, |backend| backend.print_to_string())
}

const ADD_AND_MAIN: &str = "
func add(a: int, b: int) -> int {
    return a + b
}

func main() -> int {
    let x: int -> add(1, 2)
    return x
}
";

const POINT: &str = "
Point -> struct { x: int, y: int }

func main() -> int {
    let p: Point -> [Point]{1, 2}
    return p -> y
}
";

const MAX: &str = "
func max(a: int, b: int) -> int {
    if (a > b) {
        return a
    } else {
        return b
    }
}
";

#[test]
fn llvm_is_the_default_backend() {
    assert_eq!(BackendKind::default(), BackendKind::Llvm);
}

#[test]
fn add_and_main_lower_to_llvm() {
    let ir = ir(ADD_AND_MAIN, false);
    assert!(ir.contains("declare i32 @printf(ptr, ...)"), "{ir}");

    let load_b = ir.find("%value_ofb = load i32").expect("load of b");
    let load_a = ir.find("%value_ofa = load i32").expect("load of a");
    assert!(load_b < load_a, "right operand must be lowered first:\n{ir}");
    assert!(ir.contains("%arithmetic = add i32 %value_ofa, %value_ofb"), "{ir}");
    assert!(ir.contains("ret i32 %arithmetic"), "{ir}");

    assert!(ir.contains("%calltmp = call i32 @add(i32 1, i32 2)"), "{ir}");
    assert!(ir.contains("store i32 %calltmp, ptr %x"), "{ir}");
}

#[test]
fn every_function_passes_the_llvm_verifier() {
    with_backend(ADD_AND_MAIN, false, |backend| {
        for name in ["add", "main"] {
            let function = backend.module().get_function(name).expect("defined");
            assert!(function.verify(false), "{name}");
        }
    });
}

#[test]
fn struct_literal_lowers_to_member_geps() {
    let ir = ir(POINT, false);
    assert!(ir.contains("%Point = type { i32, i32 }"), "{ir}");
    assert!(ir.contains("%struct_PointInstance = alloca %Point"), "{ir}");
    assert!(
        ir.contains("getelementptr inbounds %Point, ptr %struct_PointInstance, i32 0, i32 0"),
        "{ir}"
    );
    assert!(
        ir.contains("getelementptr inbounds %Point, ptr %struct_PointInstance, i32 0, i32 1"),
        "{ir}"
    );
    assert!(ir.contains("store i32 1, ptr %struct_memberGEP,"), "{ir}");
    assert!(ir.contains("store i32 2, ptr %struct_memberGEP1,"), "{ir}");
    assert!(ir.contains("%member_y = load i32"), "{ir}");
}

/// Both arms return, so `ifcont` has no predecessors and ends in
/// `unreachable`.
#[test]
fn returning_arms_leave_the_merge_block_unreachable() {
    with_backend(MAX, false, |backend| {
        let max = backend.module().get_function("max").expect("max");
        assert_eq!(max.count_basic_blocks(), 4);

        let blocks = max.get_basic_blocks();
        let names: Vec<String> = blocks
            .iter()
            .map(|block| block.get_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["entry", "then", "else", "ifcont"]);

        let opcodes: Vec<Option<InstructionOpcode>> = blocks
            .iter()
            .map(|block| block.get_terminator().map(|inst| inst.get_opcode()))
            .collect();
        assert_eq!(
            opcodes,
            [
                Some(InstructionOpcode::Br),
                Some(InstructionOpcode::Return),
                Some(InstructionOpcode::Return),
                Some(InstructionOpcode::Unreachable),
            ]
        );
    });
}

#[test]
fn constants_fold_through_promoted_slots() {
    let ir = ir(
        "
func main() -> int {
    let x: int -> 2 + 3
    return x * 1
}
",
        true,
    );
    assert!(ir.contains("ret i32 5"), "{ir}");
    assert!(!ir.contains("alloca"), "{ir}");
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
    let optimized = ir(src, true);
    assert!(optimized.contains("tail call i32 @g()"), "{optimized}");
    assert!(!ir(src, false).contains("tail call"));
}

#[test]
fn calls_reading_the_callers_frame_are_not_tail() {
    let ir = ir(
        "
Point -> struct { x: int, y: int }

func get(p: Point*) -> int {
    return p -> x
}

func main() -> int {
    let p: Point -> [Point]{1, 2}
    return get(&p)
}
",
        true,
    );
    assert!(ir.contains("call i32 @get(ptr"), "{ir}");
    assert!(!ir.contains("tail call i32 @get"), "{ir}");
}

#[test]
fn per_function_cleanup_simplifies_the_cfg() {
    let src = "
func pick() -> int {
    if (1 < 2) {
        return 1
    }
    return 2
}
";
    with_backend(src, false, |backend| {
        let pick = backend.module().get_function("pick").expect("pick");
        assert!(pick.count_basic_blocks() > 1);
        backend.optimize_function(pick).expect("function pipeline runs");
        assert_eq!(pick.count_basic_blocks(), 1, "{}", backend.print_to_string());
        assert!(backend.print_to_string().contains("ret i32 1"));
    });
}

#[test]
fn unknown_pass_is_a_backend_error() {
    let context = Context::create();
    let mut backend = LlvmBackend::new(&context, "passes").expect("native target");
    let err = backend.run_pass("bogus").expect_err("no such pass");
    assert!(matches!(err, CodeGenError::Backend { .. }), "{err:?}");
    assert!(err.to_string().contains("pass `bogus` failed"), "{err}");
}
