//! LLVM backend built on inkwell.
//!
//! Enabled with the `llvm` cargo feature. The module is printed as LLVM
//! assembly; the pass list runs through the new pass manager against a
//! target machine for the host triple.

use std::path::Path;

use inkwell::AddressSpace;
use inkwell::OptimizationLevel;
use inkwell::basic_block::BasicBlock;
use inkwell::builder::{Builder, BuilderError};
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::passes::PassBuilderOptions;
use inkwell::targets::{CodeModel, InitializationConfig, RelocMode, Target, TargetMachine};
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum};
use inkwell::values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue};

use super::{Backend, BackendResult, IntBinOp, IntPredicate};
use crate::error::CodeGenError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LlvmType<'ctx> {
    Void,
    Basic(BasicTypeEnum<'ctx>),
}

impl<'ctx> LlvmType<'ctx> {
    fn basic(self) -> BackendResult<BasicTypeEnum<'ctx>> {
        match self {
            LlvmType::Basic(ty) => Ok(ty),
            LlvmType::Void => Err(CodeGenError::backend("void used as a value type")),
        }
    }
}

/// Result of lowering an expression; void calls produce `Unit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LlvmValue<'ctx> {
    Basic(BasicValueEnum<'ctx>),
    Unit,
}

impl<'ctx> LlvmValue<'ctx> {
    fn basic(self) -> BackendResult<BasicValueEnum<'ctx>> {
        match self {
            LlvmValue::Basic(value) => Ok(value),
            LlvmValue::Unit => Err(CodeGenError::backend("void value used as an operand")),
        }
    }
}

/// Cleanup run after each function verifies.
const FUNCTION_PIPELINE: &str = "function(instcombine,simplifycfg)";

fn builder_fault(err: BuilderError) -> CodeGenError {
    CodeGenError::backend(err.to_string())
}

pub struct LlvmBackend<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    machine: TargetMachine,
}

impl<'ctx> LlvmBackend<'ctx> {
    pub fn new(context: &'ctx Context, module_name: &str) -> BackendResult<Self> {
        Target::initialize_native(&InitializationConfig::default())
            .map_err(CodeGenError::backend)?;
        let triple = TargetMachine::get_default_triple();
        let target = Target::from_triple(&triple)
            .map_err(|e| CodeGenError::backend(e.to_string()))?;
        let machine = target
            .create_target_machine(
                &triple,
                "",
                "",
                OptimizationLevel::Default,
                RelocMode::Default,
                CodeModel::Default,
            )
            .ok_or_else(|| CodeGenError::backend("failed to create a target machine"))?;

        let module = context.create_module(module_name);
        module.set_triple(&triple);
        module.set_data_layout(&machine.get_target_data().get_data_layout());

        Ok(Self {
            context,
            module,
            builder: context.create_builder(),
            machine,
        })
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Type = LlvmType<'ctx>;
    type Value = LlvmValue<'ctx>;
    type Function = FunctionValue<'ctx>;
    type Block = BasicBlock<'ctx>;

    fn void_type(&mut self) -> Self::Type {
        LlvmType::Void
    }

    fn int_type(&mut self, bits: u32) -> Self::Type {
        LlvmType::Basic(self.context.custom_width_int_type(bits).into())
    }

    fn float_type(&mut self) -> Self::Type {
        LlvmType::Basic(self.context.f32_type().into())
    }

    // Opaque pointers: the pointee is not part of the type.
    fn pointer_type(&mut self, _pointee: Self::Type) -> Self::Type {
        LlvmType::Basic(self.context.ptr_type(AddressSpace::default()).into())
    }

    fn opaque_struct_type(&mut self, name: &str) -> BackendResult<Self::Type> {
        if self.module.get_struct_type(name).is_some() {
            return Err(CodeGenError::backend(format!("struct type `%{name}` already exists")));
        }
        Ok(LlvmType::Basic(self.context.opaque_struct_type(name).into()))
    }

    fn set_struct_body(&mut self, ty: Self::Type, members: &[Self::Type]) -> BackendResult<()> {
        let members = members
            .iter()
            .map(|member| member.basic())
            .collect::<BackendResult<Vec<_>>>()?;
        if !ty.basic()?.into_struct_type().set_body(&members, false) {
            return Err(CodeGenError::backend("struct body was already set"));
        }
        Ok(())
    }

    fn add_function(
        &mut self,
        name: &str,
        params: &[Self::Type],
        ret: Self::Type,
        variadic: bool,
    ) -> BackendResult<Self::Function> {
        let params = params
            .iter()
            .map(|param| param.basic().map(BasicMetadataTypeEnum::from))
            .collect::<BackendResult<Vec<_>>>()?;
        let fn_type = match ret {
            LlvmType::Void => self.context.void_type().fn_type(&params, variadic),
            LlvmType::Basic(ret) => ret.fn_type(&params, variadic),
        };
        Ok(self.module.add_function(name, fn_type, None))
    }

    fn function_param(&self, function: Self::Function, index: u32) -> BackendResult<Self::Value> {
        function
            .get_nth_param(index)
            .map(LlvmValue::Basic)
            .ok_or_else(|| CodeGenError::backend(format!("no parameter {index}")))
    }

    fn append_block(&mut self, function: Self::Function, name: &str) -> Self::Block {
        self.context.append_basic_block(function, name)
    }

    fn position_at_end(&mut self, block: Self::Block) {
        self.builder.position_at_end(block);
    }

    fn current_function(&self) -> Option<Self::Function> {
        self.builder.get_insert_block().and_then(|block| block.get_parent())
    }

    fn current_block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|block| block.get_terminator().is_some())
    }

    fn build_entry_alloca(&mut self, ty: Self::Type, name: &str) -> BackendResult<Self::Value> {
        let function = self.current_function().ok_or(CodeGenError::NoInsertionPoint)?;
        let entry = function
            .get_first_basic_block()
            .ok_or(CodeGenError::NoInsertionPoint)?;
        let entry_builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => entry_builder.position_before(&first),
            None => entry_builder.position_at_end(entry),
        }
        let slot = entry_builder
            .build_alloca(ty.basic()?, name)
            .map_err(builder_fault)?;
        Ok(LlvmValue::Basic(slot.into()))
    }

    fn build_store(&mut self, value: Self::Value, ptr: Self::Value) -> BackendResult<()> {
        self.builder
            .build_store(ptr.basic()?.into_pointer_value(), value.basic()?)
            .map_err(builder_fault)?;
        Ok(())
    }

    fn build_load(
        &mut self,
        ty: Self::Type,
        ptr: Self::Value,
        name: &str,
    ) -> BackendResult<Self::Value> {
        let value = self
            .builder
            .build_load(ty.basic()?, ptr.basic()?.into_pointer_value(), name)
            .map_err(builder_fault)?;
        Ok(LlvmValue::Basic(value))
    }

    fn build_call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
        name: &str,
    ) -> BackendResult<Self::Value> {
        let args = args
            .iter()
            .map(|arg| arg.basic().map(BasicMetadataValueEnum::from))
            .collect::<BackendResult<Vec<_>>>()?;
        // Void results cannot be named.
        let name = if function.get_type().get_return_type().is_some() {
            name
        } else {
            ""
        };
        let call = self
            .builder
            .build_call(function, &args, name)
            .map_err(builder_fault)?;
        Ok(call
            .try_as_basic_value()
            .left()
            .map(LlvmValue::Basic)
            .unwrap_or(LlvmValue::Unit))
    }

    fn build_int_binary(
        &mut self,
        op: IntBinOp,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> BackendResult<Self::Value> {
        let lhs = lhs.basic()?.into_int_value();
        let rhs = rhs.basic()?.into_int_value();
        let value = match op {
            IntBinOp::Add => self.builder.build_int_add(lhs, rhs, name),
            IntBinOp::Sub => self.builder.build_int_sub(lhs, rhs, name),
            IntBinOp::Mul => self.builder.build_int_mul(lhs, rhs, name),
            IntBinOp::SDiv => self.builder.build_int_signed_div(lhs, rhs, name),
        }
        .map_err(builder_fault)?;
        Ok(LlvmValue::Basic(value.into()))
    }

    fn build_int_compare(
        &mut self,
        predicate: IntPredicate,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> BackendResult<Self::Value> {
        let predicate = match predicate {
            IntPredicate::Sgt => inkwell::IntPredicate::SGT,
            IntPredicate::Slt => inkwell::IntPredicate::SLT,
            IntPredicate::Sge => inkwell::IntPredicate::SGE,
            IntPredicate::Sle => inkwell::IntPredicate::SLE,
            IntPredicate::Eq => inkwell::IntPredicate::EQ,
            IntPredicate::Ne => inkwell::IntPredicate::NE,
        };
        let value = self
            .builder
            .build_int_compare(
                predicate,
                lhs.basic()?.into_int_value(),
                rhs.basic()?.into_int_value(),
                name,
            )
            .map_err(builder_fault)?;
        Ok(LlvmValue::Basic(value.into()))
    }

    fn build_cond_br(
        &mut self,
        cond: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> BackendResult<()> {
        self.builder
            .build_conditional_branch(cond.basic()?.into_int_value(), then_block, else_block)
            .map_err(builder_fault)?;
        Ok(())
    }

    fn build_br(&mut self, dest: Self::Block) -> BackendResult<()> {
        self.builder
            .build_unconditional_branch(dest)
            .map_err(builder_fault)?;
        Ok(())
    }

    fn build_return(&mut self, value: Option<Self::Value>) -> BackendResult<()> {
        match value {
            Some(value) => {
                let value = value.basic()?;
                self.builder
                    .build_return(Some(&value as &dyn BasicValue<'ctx>))
                    .map_err(builder_fault)?;
            }
            None => {
                self.builder.build_return(None).map_err(builder_fault)?;
            }
        }
        Ok(())
    }

    fn build_unreachable(&mut self) -> BackendResult<()> {
        self.builder.build_unreachable().map_err(builder_fault)?;
        Ok(())
    }

    fn build_struct_gep(
        &mut self,
        struct_ty: Self::Type,
        ptr: Self::Value,
        index: u32,
        name: &str,
    ) -> BackendResult<Self::Value> {
        let struct_ty = struct_ty.basic()?.into_struct_type();
        let gep = self
            .builder
            .build_struct_gep(struct_ty, ptr.basic()?.into_pointer_value(), index, name)
            .map_err(builder_fault)?;
        Ok(LlvmValue::Basic(gep.into()))
    }

    fn build_global_string(&mut self, text: &str, name: &str) -> BackendResult<Self::Value> {
        let global = self
            .builder
            .build_global_string_ptr(text, name)
            .map_err(builder_fault)?;
        Ok(LlvmValue::Basic(global.as_pointer_value().into()))
    }

    fn const_int(&mut self, ty: Self::Type, value: i64) -> BackendResult<Self::Value> {
        let int_ty = ty.basic()?.into_int_type();
        Ok(LlvmValue::Basic(int_ty.const_int(value as u64, true).into()))
    }

    fn verify_function(&self, function: Self::Function) -> BackendResult<()> {
        if function.verify(true) {
            Ok(())
        } else {
            Err(CodeGenError::verification(
                function.get_name().to_string_lossy(),
                "LLVM function verifier rejected the function",
            ))
        }
    }

    // The new pass manager only runs on whole modules. Functions lowered
    // earlier went through the same pipeline already.
    fn optimize_function(&mut self, function: Self::Function) -> BackendResult<()> {
        log::trace!(
            "running {FUNCTION_PIPELINE} after @{}",
            function.get_name().to_string_lossy()
        );
        self.module
            .run_passes(FUNCTION_PIPELINE, &self.machine, PassBuilderOptions::create())
            .map_err(|e| CodeGenError::backend(format!("function pipeline failed: {e}")))
    }

    fn run_pass(&mut self, pass: &str) -> BackendResult<()> {
        self.module
            .run_passes(pass, &self.machine, PassBuilderOptions::create())
            .map_err(|e| CodeGenError::backend(format!("pass `{pass}` failed: {e}")))
    }

    fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    fn write_to_file(&self, path: &Path) -> BackendResult<()> {
        self.module
            .print_to_file(path)
            .map_err(|e| CodeGenError::backend(format!("failed to write `{}`: {e}", path.display())))
    }
}
