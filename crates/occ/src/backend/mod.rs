//! The IR backend contract consumed by the code generator.
//!
//! A backend owns one module and one builder cursor for the duration of a
//! compilation. Handles are small `Copy` values that are only meaningful to
//! the backend that produced them. Dropping the backend releases everything
//! it holds.

#[cfg(feature = "llvm")]
pub mod llvm;
pub mod ssa;

use std::fmt;
use std::path::Path;

use crate::error::CodeGenError;

pub type BackendResult<T> = Result<T, CodeGenError>;

/// Optimization passes run over every finished module, in this order.
pub const PASS_PIPELINE: [&str; 5] = ["tailcallelim", "mem2reg", "gvn", "instcombine", "early-cse"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntBinOp {
    Add,
    Sub,
    Mul,
    SDiv,
}

impl IntBinOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            IntBinOp::Add => "add",
            IntBinOp::Sub => "sub",
            IntBinOp::Mul => "mul",
            IntBinOp::SDiv => "sdiv",
        }
    }
}

/// Signed integer comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Sgt,
    Slt,
    Sge,
    Sle,
    Eq,
    Ne,
}

impl IntPredicate {
    pub fn mnemonic(self) -> &'static str {
        match self {
            IntPredicate::Sgt => "sgt",
            IntPredicate::Slt => "slt",
            IntPredicate::Sge => "sge",
            IntPredicate::Sle => "sle",
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
        }
    }

    pub fn evaluate(self, lhs: i64, rhs: i64) -> bool {
        match self {
            IntPredicate::Sgt => lhs > rhs,
            IntPredicate::Slt => lhs < rhs,
            IntPredicate::Sge => lhs >= rhs,
            IntPredicate::Sle => lhs <= rhs,
            IntPredicate::Eq => lhs == rhs,
            IntPredicate::Ne => lhs != rhs,
        }
    }
}

pub trait Backend {
    type Type: Copy + fmt::Debug;
    type Value: Copy + fmt::Debug;
    type Function: Copy + fmt::Debug;
    type Block: Copy + fmt::Debug;

    // Types
    fn void_type(&mut self) -> Self::Type;
    fn int_type(&mut self, bits: u32) -> Self::Type;
    fn float_type(&mut self) -> Self::Type;
    fn pointer_type(&mut self, pointee: Self::Type) -> Self::Type;
    /// Declares a named aggregate with no body yet, so members can point back at it.
    fn opaque_struct_type(&mut self, name: &str) -> BackendResult<Self::Type>;
    /// Fills in the member types of an opaque aggregate, in order.
    fn set_struct_body(&mut self, ty: Self::Type, members: &[Self::Type]) -> BackendResult<()>;

    // Functions and blocks
    fn add_function(
        &mut self,
        name: &str,
        params: &[Self::Type],
        ret: Self::Type,
        variadic: bool,
    ) -> BackendResult<Self::Function>;
    fn function_param(&self, function: Self::Function, index: u32) -> BackendResult<Self::Value>;
    fn append_block(&mut self, function: Self::Function, name: &str) -> Self::Block;
    fn position_at_end(&mut self, block: Self::Block);
    fn current_function(&self) -> Option<Self::Function>;
    /// Whether the block under the cursor already ends in a terminator.
    fn current_block_terminated(&self) -> bool;

    // Instructions
    /// Allocates a stack slot at the top of the current function's entry block.
    fn build_entry_alloca(&mut self, ty: Self::Type, name: &str) -> BackendResult<Self::Value>;
    fn build_store(&mut self, value: Self::Value, ptr: Self::Value) -> BackendResult<()>;
    fn build_load(
        &mut self,
        ty: Self::Type,
        ptr: Self::Value,
        name: &str,
    ) -> BackendResult<Self::Value>;
    fn build_call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
        name: &str,
    ) -> BackendResult<Self::Value>;
    fn build_int_binary(
        &mut self,
        op: IntBinOp,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> BackendResult<Self::Value>;
    fn build_int_compare(
        &mut self,
        predicate: IntPredicate,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> BackendResult<Self::Value>;
    fn build_cond_br(
        &mut self,
        cond: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> BackendResult<()>;
    fn build_br(&mut self, dest: Self::Block) -> BackendResult<()>;
    fn build_return(&mut self, value: Option<Self::Value>) -> BackendResult<()>;
    fn build_unreachable(&mut self) -> BackendResult<()>;
    fn build_struct_gep(
        &mut self,
        struct_ty: Self::Type,
        ptr: Self::Value,
        index: u32,
        name: &str,
    ) -> BackendResult<Self::Value>;
    /// A pointer to a NUL-terminated private constant holding `text`.
    fn build_global_string(&mut self, text: &str, name: &str) -> BackendResult<Self::Value>;
    fn const_int(&mut self, ty: Self::Type, value: i64) -> BackendResult<Self::Value>;

    fn build_return_void(&mut self) -> BackendResult<()> {
        self.build_return(None)
    }

    // Whole-function and whole-module operations
    fn verify_function(&self, function: Self::Function) -> BackendResult<()>;
    /// Per-function cleanup run right after a function verifies.
    fn optimize_function(&mut self, function: Self::Function) -> BackendResult<()>;
    fn run_pass(&mut self, pass: &str) -> BackendResult<()>;
    fn print_to_string(&self) -> String;
    fn write_to_file(&self, path: &Path) -> BackendResult<()>;
}
