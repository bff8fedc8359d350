//! The Overcast compiler core: binder, code generator, IR backends and the
//! driver used by the `occ` binary.

pub mod backend;
pub mod binder;
pub mod builder;
pub mod codegen;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod types;

use std::path::PathBuf;
use std::str::FromStr;

pub use builder::{compile_source, compile_to_ir, CompileOutcome, StageTimings};
pub use error::{BindError, CodeGenError, CompileError};

/// Which IR backend lowers the program.
///
/// LLVM is the default whenever the `llvm` feature is compiled in; the
/// in-crate SSA backend covers builds without an LLVM installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// The in-crate SSA module with its own pass implementations.
    Ssa,
    /// LLVM through inkwell; needs the `llvm` cargo feature.
    Llvm,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "llvm") {
            BackendKind::Llvm
        } else {
            BackendKind::Ssa
        }
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ssa" => Ok(BackendKind::Ssa),
            "llvm" => Ok(BackendKind::Llvm),
            other => anyhow::bail!("unknown backend `{other}` (expected `ssa` or `llvm`)"),
        }
    }
}

/// Compilation options for the Overcast compiler.
///
/// Kept separate from CLI parsing so the driver can be used as a library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Path to the source file to compile.
    pub src_file: PathBuf,

    /// Exact output path; overrides `out_dir`.
    pub output: Option<PathBuf>,

    /// Directory for `<stem>.ll` when `output` is not set.
    pub out_dir: Option<PathBuf>,

    /// Backend module name; defaults to the source file's stem.
    pub module_name: Option<String>,

    /// Run the per-function optimizer and the module pass pipeline.
    pub optimize: bool,

    pub backend: BackendKind,
}

impl CompileOptions {
    pub fn new(src_file: impl Into<PathBuf>) -> Self {
        Self {
            src_file: src_file.into(),
            output: None,
            out_dir: None,
            module_name: None,
            optimize: true,
            backend: BackendKind::default(),
        }
    }

    /// Applies `OCC_OUT_DIR`, `OCC_NO_OPT=1` and `OCC_BACKEND`. The driver
    /// calls this before applying command-line flags, so flags win.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(dir) = std::env::var("OCC_OUT_DIR") {
            self.out_dir = Some(PathBuf::from(dir));
        }
        if std::env::var("OCC_NO_OPT").is_ok_and(|v| v == "1") {
            self.optimize = false;
        }
        if let Ok(backend) = std::env::var("OCC_BACKEND") {
            self.backend = backend.parse()?;
        }
        Ok(())
    }
}

/// Compile a source file with the given options.
///
/// This is the primary API for invoking the compiler programmatically.
/// Returns the written output path, the IR text and the stage timings.
pub fn compile(options: &CompileOptions) -> anyhow::Result<CompileOutcome> {
    builder::compile_with_options(options)
}
