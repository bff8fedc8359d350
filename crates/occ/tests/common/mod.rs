//! Common testing utilities for the occ test suite.
//!
//! Every helper silences diagnostics for its duration so failing-input tests
//! keep stderr clean.

#![allow(dead_code)]

use occ::backend::ssa::{Function, Module, SsaBackend};
use occ::binder::Binder;
use occ::codegen::CodeGenOptions;
use occ::{BindError, CompileError};

/// Parses and binds `src`, returning the binder's verdict.
pub fn bind_source(src: &str) -> Result<Binder, BindError> {
    let _guard = occ::diagnostics::suppress();
    let program =
        overcast_parser::parse_source(src).map_err(|err| BindError::new(err.to_string()))?;
    let mut binder = Binder::new();
    binder.bind_program(&program)?;
    Ok(binder)
}

/// The binder's error message for `src`, panicking when it binds.
pub fn bind_error(src: &str) -> String {
    match bind_source(src) {
        Ok(_) => panic!("expected a bind error for:\n{src}"),
        Err(err) => err.message,
    }
}

/// Compiles `src` with the SSA backend and returns its module.
pub fn compile_module(src: &str, optimize: bool) -> Result<Module, CompileError> {
    let _guard = occ::diagnostics::suppress();
    let backend = SsaBackend::new("test");
    let compilation = occ::compile_source(src, backend, CodeGenOptions { optimize })?;
    Ok(compilation.backend.into_module())
}

/// Unoptimized module; panics on any pipeline error.
pub fn raw_module(src: &str) -> Module {
    match compile_module(src, false) {
        Ok(module) => module,
        Err(err) => panic!("compilation failed: {err}\n{src}"),
    }
}

/// Textual IR of `src`, unoptimized.
pub fn raw_ir(src: &str) -> String {
    raw_module(src).to_string()
}

pub fn function<'m>(module: &'m Module, name: &str) -> &'m Function {
    match module.function(name) {
        Some(function) => function,
        None => panic!("no function `{name}` in module:\n{module}"),
    }
}
