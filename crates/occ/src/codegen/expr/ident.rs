use overcast_ast::Expr;

use crate::backend::{Backend, BackendResult};
use crate::codegen::helpers::is_aggregate;
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Address of a variable's current storage.
    fn variable_address(&self, name: &str) -> BackendResult<B::Value> {
        let local = self.env.local(name)?;
        if is_aggregate(&local.ty)
            && let Some(slot) = self.env.struct_allocas.get(name)
        {
            return Ok(*slot);
        }
        Ok(local.slot)
    }

    /// Scalars are loaded; struct variables push their slot.
    pub(crate) fn lower_variable(&mut self, name: &str) -> BackendResult<()> {
        let local = self.env.local(name)?;
        if is_aggregate(&local.ty) {
            let slot = self.variable_address(name)?;
            self.env.push(slot);
            return Ok(());
        }
        let (storage_ty, slot) = (local.storage_ty, local.slot);
        let value = self
            .backend
            .build_load(storage_ty, slot, &format!("value_of{name}"))?;
        self.env.push(value);
        Ok(())
    }

    /// `&place`: the address of a variable or a struct member.
    pub(crate) fn lower_reference(&mut self, inner: &Expr) -> BackendResult<()> {
        let address = match inner {
            Expr::Variable(name) => self.variable_address(name)?,
            Expr::StructMemberAccess(access) => self.lower_member_address(access)?.0,
            other => {
                return Err(CodeGenError::Unsupported(format!(
                    "a reference to {other:?}"
                )));
            }
        };
        self.env.push(address);
        Ok(())
    }
}
