//! The compilation pipeline.
//!
//! Stages run strictly in order and each one consumes its input completely:
//! tokenize, parse, bind, lower. The first failing stage stops the run and
//! nothing is written. On success the backend module is printed to the
//! output path.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use overcast_ast::Program;
use overcast_parser::Parser;
use overcast_parser::tokenizer::tokenize;

use crate::backend::Backend;
use crate::backend::ssa::SsaBackend;
use crate::binder::Binder;
use crate::codegen::{CodeGen, CodeGenOptions};
use crate::diagnostics;
use crate::error::CompileError;
use crate::{BackendKind, CompileOptions};

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub lex: Duration,
    pub parse: Duration,
    pub bind: Duration,
    pub codegen: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.lex + self.parse + self.bind + self.codegen
    }
}

/// A finished in-memory compilation.
pub struct Compilation<B: Backend> {
    pub program: Program,
    pub backend: B,
    pub timings: StageTimings,
}

/// What the driver produced on disk.
#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub output: PathBuf,
    pub ir: String,
    pub timings: StageTimings,
}

fn timed<T, E>(
    stage: &str,
    slot: &mut Duration,
    run: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let start = Instant::now();
    let result = run();
    *slot = start.elapsed();
    log::info!("{stage}: {:.3} ms", slot.as_secs_f64() * 1000.0);
    result
}

/// Runs every stage over `source`, lowering into `backend`.
///
/// On failure the backend is dropped together with everything built so far.
pub fn compile_source<B: Backend>(
    source: &str,
    backend: B,
    options: CodeGenOptions,
) -> Result<Compilation<B>, CompileError> {
    let mut timings = StageTimings::default();

    let tokens = timed("lex", &mut timings.lex, || tokenize(source))?;
    log::debug!("{} token(s)", tokens.len());

    let program = timed("parse", &mut timings.parse, || Parser::new(tokens).parse_program())?;
    log::debug!("{} top-level statement(s)", program.body.len());

    timed("bind", &mut timings.bind, || Binder::new().bind_program(&program))?;

    let mut codegen = CodeGen::new(backend, options);
    timed("codegen", &mut timings.codegen, || codegen.emit_module(&program))?;
    let backend = codegen.into_backend();
    log::debug!("module:\n{}", backend.print_to_string());

    Ok(Compilation {
        program,
        backend,
        timings,
    })
}

/// Compiles in memory with the in-crate SSA backend and returns the IR text.
pub fn compile_to_ir(
    source: &str,
    module_name: &str,
    optimize: bool,
) -> Result<String, CompileError> {
    let backend = SsaBackend::new(module_name);
    let compilation = compile_source(source, backend, CodeGenOptions { optimize })?;
    Ok(compilation.backend.print_to_string())
}

/// Where the module goes: `-o` as given, else `<out_dir>/<stem>.ll`.
pub fn output_path(options: &CompileOptions) -> PathBuf {
    if let Some(output) = &options.output {
        return output.clone();
    }
    let stem = source_stem(&options.src_file);
    let dir = options.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    dir.join(format!("{stem}.ll"))
}

fn source_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("module")
        .to_string()
}

/// Reads, compiles and writes one source file.
///
/// Pipeline errors are reported as diagnostics against the source before
/// being returned.
pub fn compile_with_options(options: &CompileOptions) -> Result<CompileOutcome> {
    let source = std::fs::read_to_string(&options.src_file).map_err(|source| CompileError::Io {
        path: options.src_file.clone(),
        source,
    })?;
    let module_name = options
        .module_name
        .clone()
        .unwrap_or_else(|| source_stem(&options.src_file));
    let codegen_options = CodeGenOptions {
        optimize: options.optimize,
    };
    let output = output_path(options);
    let file = options.src_file.display().to_string();

    match options.backend {
        BackendKind::Ssa => {
            let result = compile_source(&source, SsaBackend::new(module_name), codegen_options);
            finish(result, &file, &source, output)
        }
        #[cfg(feature = "llvm")]
        BackendKind::Llvm => {
            let context = inkwell::context::Context::create();
            let result = crate::backend::llvm::LlvmBackend::new(&context, &module_name)
                .map_err(CompileError::from)
                .and_then(|backend| compile_source(&source, backend, codegen_options));
            finish(result, &file, &source, output)
        }
        #[cfg(not(feature = "llvm"))]
        BackendKind::Llvm => {
            anyhow::bail!("the LLVM backend is not available; rebuild occ with `--features llvm`")
        }
    }
}

fn finish<B: Backend>(
    result: Result<Compilation<B>, CompileError>,
    file: &str,
    source: &str,
    output: PathBuf,
) -> Result<CompileOutcome> {
    let compilation = match result {
        Ok(compilation) => compilation,
        Err(err) => {
            diagnostics::report_error(Some(file), Some(source), &err);
            return Err(err.into());
        }
    };

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    compilation
        .backend
        .write_to_file(&output)
        .with_context(|| format!("failed to write `{}`", output.display()))?;

    let timings = compilation.timings;
    log::info!("total: {:.3} ms", timings.total().as_secs_f64() * 1000.0);
    Ok(CompileOutcome {
        output,
        ir: compilation.backend.print_to_string(),
        timings,
    })
}
