//! Driver behaviour through the `occ` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ADD: &str = "
func add(a: int, b: int) -> int {
    return a + b
}

func main() -> int {
    print(\"%d\\n\", add(1, 2))
    return 0
}
";

fn occ(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("occ").expect("occ binary is built");
    cmd.current_dir(dir)
        .env_remove("OCC_OUT_DIR")
        .env_remove("OCC_NO_OPT")
        .env_remove("OCC_BACKEND")
        .env_remove("OCC_LOG")
        .env_remove("OCC_VERBOSE")
        .arg("--color")
        .arg("never");
    cmd
}

fn write_source(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).expect("write source");
    path
}

#[test]
fn writes_module_next_to_the_working_directory() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);

    occ(dir.path())
        .arg("add.oc")
        .assert()
        .success()
        .stderr(predicate::str::contains("Compiled add.oc -> ./add.ll"));

    let ir = fs::read_to_string(dir.path().join("add.ll")).expect("add.ll written");
    assert!(ir.contains("define i32 @add("), "{ir}");
    assert!(ir.contains("declare i32 @printf(ptr, ...)"), "{ir}");
}

#[test]
fn output_flag_and_out_dir() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);

    occ(dir.path())
        .args(["add.oc", "-o", "build/custom.ll", "-q"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    assert!(dir.path().join("build/custom.ll").is_file());

    occ(dir.path())
        .args(["add.oc", "--out-dir", "out", "-q"])
        .assert()
        .success();
    assert!(dir.path().join("out/add.ll").is_file());

    occ(dir.path())
        .env("OCC_OUT_DIR", "from-env")
        .args(["add.oc", "-q"])
        .assert()
        .success();
    assert!(dir.path().join("from-env/add.ll").is_file());
}

#[test]
fn print_ir_and_module_name() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);

    occ(dir.path())
        .args(["add.oc", "--print-ir", "--module-name", "demo", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("; ModuleID = 'demo'"))
        .stdout(predicate::str::contains("define i32 @main()"));
}

#[test]
fn no_opt_keeps_stack_slots() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);

    let unoptimized = occ(dir.path())
        .args(["add.oc", "--no-opt", "--print-ir", "-q"])
        .assert()
        .success();
    let text = String::from_utf8_lossy(&unoptimized.get_output().stdout).to_string();
    assert!(text.contains("alloca i32"), "{text}");

    let optimized = occ(dir.path())
        .args(["add.oc", "--print-ir", "-q"])
        .assert()
        .success();
    let text = String::from_utf8_lossy(&optimized.get_output().stdout).to_string();
    assert!(!text.contains("alloca"), "{text}");
}

#[test]
fn parse_errors_are_reported_with_position() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "bad.oc", "func main() -> int {\n    return 1 +\n}\n");

    occ(dir.path())
        .arg("bad.oc")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("--> bad.oc:3:1"));
    assert!(!dir.path().join("bad.ll").exists());
}

#[test]
fn bind_errors_name_the_stage() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "bad.oc", "func main() -> int {\n    return \"no\"\n}\n");

    occ(dir.path())
        .arg("bad.oc")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Return/Function type mismatch"))
        .stderr(predicate::str::contains("note: bind stage"));
    assert!(!dir.path().join("bad.ll").exists());
}

#[test]
fn missing_source_fails() {
    let dir = TempDir::new().expect("tempdir");
    occ(dir.path())
        .arg("nope.oc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.oc"));
}

#[cfg(not(feature = "llvm"))]
#[test]
fn llvm_backend_needs_the_feature() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);
    occ(dir.path())
        .args(["add.oc", "--backend", "llvm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--features llvm"));
}

#[cfg(feature = "llvm")]
#[test]
fn llvm_is_used_unless_ssa_is_requested() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);
    occ(dir.path())
        .args(["add.oc", "--print-ir", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target triple"));
    occ(dir.path())
        .args(["add.oc", "--print-ir", "-q", "--backend", "ssa"])
        .assert()
        .success()
        .stdout(predicate::str::contains("target triple").not());
}

#[test]
fn unknown_backend_in_env_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    write_source(&dir, "add.oc", ADD);
    occ(dir.path())
        .env("OCC_BACKEND", "gcc")
        .arg("add.oc")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown backend `gcc`"));
}
