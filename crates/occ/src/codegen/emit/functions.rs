//! Function generation for code generation.

use overcast_ast::FunctionDecl;

use crate::backend::{Backend, BackendResult};
use crate::codegen::helpers::{is_aggregate, FunctionEntry, LocalSlot};
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Generates IR for a function declaration.
    ///
    /// The function is registered before its body is lowered so it can call
    /// itself. Every parameter gets a stack slot in the entry block. A body
    /// that falls off the end returns `void` or, for a non-void function,
    /// ends in `unreachable`. The finished function is verified and, when
    /// optimization is enabled, handed to the backend's per-function
    /// optimizer.
    pub(crate) fn gen_function_ir(&mut self, decl: &FunctionDecl) -> BackendResult<B::Function> {
        if let Some(outer) = &self.env.current_function {
            return Err(CodeGenError::Unsupported(format!(
                "function `{}` nested inside `{outer}`",
                decl.name
            )));
        }

        let mut param_types = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            param_types.push(self.backend_type(&param.ty)?);
        }
        let ret_ty = self.backend_type(&decl.return_type)?;
        let function = self
            .backend
            .add_function(&decl.name, &param_types, ret_ty, false)?;
        self.env.functions.insert(
            decl.name.clone(),
            FunctionEntry {
                value: function,
                params: decl.params.iter().map(|p| p.ty.clone()).collect(),
                return_type: decl.return_type.clone(),
                variadic: false,
            },
        );

        let entry = self.backend.append_block(function, "entry");
        self.backend.position_at_end(entry);
        self.env.current_function = Some(decl.name.clone());
        self.env.current_return = Some(decl.return_type.clone());

        let lowered = self.lower_function_body(function, decl, &param_types);
        let residue = self.env.clear_function_state();
        lowered?;
        if residue != 0 {
            return Err(CodeGenError::OperandStackResidue {
                function: decl.name.clone(),
                count: residue,
            });
        }

        self.backend.verify_function(function)?;
        if self.options.optimize {
            self.backend.optimize_function(function)?;
        }
        log::trace!("lowered function {}", decl.name);
        Ok(function)
    }

    fn lower_function_body(
        &mut self,
        function: B::Function,
        decl: &FunctionDecl,
        param_types: &[B::Type],
    ) -> BackendResult<()> {
        for (index, (param, storage_ty)) in decl.params.iter().zip(param_types).enumerate() {
            let index = u32::try_from(index)
                .map_err(|_| CodeGenError::backend("too many parameters"))?;
            let value = self.backend.function_param(function, index)?;
            let slot = self.backend.build_entry_alloca(*storage_ty, &param.name)?;
            self.backend.build_store(value, slot)?;
            if is_aggregate(&param.ty) {
                self.env.struct_allocas.insert(param.name.clone(), slot);
            }
            self.env.locals.insert(
                param.name.clone(),
                LocalSlot {
                    ty: param.ty.clone(),
                    storage_ty: *storage_ty,
                    slot,
                },
            );
        }

        let terminated = self.lower_stmts(&decl.body.stmts)?;
        if !terminated && !self.backend.current_block_terminated() {
            if decl.return_type.is_void() {
                self.backend.build_return_void()?;
            } else {
                self.backend.build_unreachable()?;
            }
        }
        Ok(())
    }
}
