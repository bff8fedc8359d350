//! Code generation for top-level items.
//!
//! Module lowering declares the `printf` symbol behind the built-in
//! `print`, lowers the program's declarations in source order and finally
//! runs [`PASS_PIPELINE`] over the module. Struct declarations become named
//! backend aggregates whose member order is the declaration order.

pub mod functions;

use overcast_ast::{OcType, Program, StructDecl};
use overcast_parser::PRINT_FUNCTION;

use super::helpers::FunctionEntry;
use super::PRINTF_SYMBOL;
use crate::backend::{Backend, BackendResult, PASS_PIPELINE};
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    pub(crate) fn gen_module_ir(&mut self, program: &Program) -> BackendResult<()> {
        self.declare_printf()?;

        let lowered = program
            .body
            .iter()
            .try_for_each(|stmt| self.lower_stmt(stmt).map(|_| ()));
        lowered.map_err(|err| self.attach_module_dump(err))?;

        if self.options.optimize {
            for pass in PASS_PIPELINE {
                log::trace!("running module pass {pass}");
                self.backend
                    .run_pass(pass)
                    .map_err(|err| self.attach_module_dump(err))?;
            }
        }
        Ok(())
    }

    /// `int printf(string format, ...)`, reachable from source as `print`.
    fn declare_printf(&mut self) -> BackendResult<()> {
        let string_ty = self.backend_type(&OcType::string())?;
        let int_ty = self.backend_type(&OcType::int())?;
        let printf = self
            .backend
            .add_function(PRINTF_SYMBOL, &[string_ty], int_ty, true)?;
        self.env.functions.insert(
            PRINT_FUNCTION.to_string(),
            FunctionEntry {
                value: printf,
                params: vec![OcType::string()],
                return_type: OcType::int(),
                variadic: true,
            },
        );
        Ok(())
    }

    /// Backend faults and verifier failures carry the partially built module.
    fn attach_module_dump(&self, err: CodeGenError) -> CodeGenError {
        match err {
            CodeGenError::Backend {
                message,
                module_dump: None,
            } => CodeGenError::Backend {
                message,
                module_dump: Some(self.backend.print_to_string()),
            },
            CodeGenError::Verification {
                function,
                message,
                module_dump: None,
            } => CodeGenError::Verification {
                function,
                message,
                module_dump: Some(self.backend.print_to_string()),
            },
            other => other,
        }
    }

    pub(crate) fn gen_struct_type(&mut self, decl: &StructDecl) -> BackendResult<()> {
        // Registered before its members are mapped so `Self*` members resolve.
        let struct_ty = self.backend.opaque_struct_type(&decl.name)?;
        self.env.struct_types.insert(decl.name.clone(), struct_ty);

        let mut members = Vec::with_capacity(decl.members.len());
        for member in &decl.members {
            members.push(self.backend_type(&member.ty)?);
        }
        self.backend.set_struct_body(struct_ty, &members)?;
        self.env
            .struct_layouts
            .insert(decl.name.clone(), decl.layout());
        log::trace!("declared struct {} with {} member(s)", decl.name, members.len());
        Ok(())
    }
}
