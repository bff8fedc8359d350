//! Top-level codegen module
//!
//! [`CodeGen`] walks a bound [`Program`] and drives a [`Backend`]. The
//! pipeline is organized across submodules:
//! - `emit` : module and function lowering
//! - `stmt` : statement lowering
//! - `expr` : expression lowering
//! - `helpers` : the lowering environment and small shared utilities
//!
//! Expressions communicate through an operand stack: every expression pushes
//! exactly one value and every consumer pops exactly one. Struct-typed
//! expressions push the address of their aggregate rather than the aggregate
//! itself, so member access and member assignment address storage directly.

pub mod emit;
pub mod expr;
pub mod helpers;
pub mod stmt;

use overcast_ast::Program;

use crate::backend::{Backend, BackendResult};
use helpers::Environment;

/// Name of the C symbol the built-in `print` lowers to.
pub const PRINTF_SYMBOL: &str = "printf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenOptions {
    /// Run the per-function optimizer and the module pass pipeline.
    pub optimize: bool,
}

impl Default for CodeGenOptions {
    fn default() -> Self {
        Self { optimize: true }
    }
}

pub struct CodeGen<B: Backend> {
    pub(crate) backend: B,
    pub(crate) env: Environment<B>,
    pub(crate) options: CodeGenOptions,
}

impl<B: Backend> CodeGen<B> {
    pub fn new(backend: B, options: CodeGenOptions) -> Self {
        Self {
            backend,
            env: Environment::default(),
            options,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Lowers a whole program into the backend's module.
    pub fn emit_module(&mut self, program: &Program) -> BackendResult<()> {
        self.gen_module_ir(program)
    }
}
