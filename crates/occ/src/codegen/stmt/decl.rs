//! Variable declarations and assignments.
//!
//! Scalars get one entry-block slot per declaration, initialized by a
//! store and read back with a load. Struct variables additionally appear in
//! the struct-alloca table. A struct declared from a freshly built aggregate
//! (a struct literal or a call) adopts that storage; one declared from
//! another variable or member gets its own slot and a copy, so structs keep
//! value semantics. Reassigning a struct stores into the variable's current
//! slot.

use overcast_ast::{Expr, StructMemberSet, VariableDecl, VariableSet};

use crate::backend::{Backend, BackendResult};
use crate::codegen::helpers::{is_aggregate, LocalSlot};

/// Expressions whose aggregate nobody else refers to.
fn is_fresh_aggregate(expr: &Expr) -> bool {
    matches!(expr, Expr::StructObjCreation(_) | Expr::InvokeFunction(_))
}

impl<B: Backend> crate::codegen::CodeGen<B> {
    pub(crate) fn lower_var_decl(&mut self, decl: &VariableDecl) -> BackendResult<bool> {
        let storage_ty = self.backend_type(&decl.ty)?;
        let slot = if is_aggregate(&decl.ty) {
            let slot = if is_fresh_aggregate(&decl.value) {
                self.lower_operand(&decl.value)?
            } else {
                let value = self.lower_rvalue(&decl.value)?;
                let slot = self.backend.build_entry_alloca(storage_ty, &decl.name)?;
                self.backend.build_store(value, slot)?;
                slot
            };
            self.env.struct_allocas.insert(decl.name.clone(), slot);
            slot
        } else {
            let value = self.lower_operand(&decl.value)?;
            let slot = self.backend.build_entry_alloca(storage_ty, &decl.name)?;
            self.backend.build_store(value, slot)?;
            slot
        };
        self.env.locals.insert(
            decl.name.clone(),
            LocalSlot {
                ty: decl.ty.clone(),
                storage_ty,
                slot,
            },
        );
        Ok(false)
    }

    pub(crate) fn lower_var_set(&mut self, set: &VariableSet) -> BackendResult<bool> {
        let local = self.env.local(&set.name)?;
        let aggregate = is_aggregate(&local.ty);
        let mut slot = local.slot;
        if aggregate && let Some(current) = self.env.struct_allocas.get(&set.name) {
            slot = *current;
        }

        let value = self.lower_rvalue(&set.value)?;
        self.backend.build_store(value, slot)?;
        if aggregate {
            self.env.struct_allocas.insert(set.name.clone(), slot);
        }
        Ok(false)
    }

    pub(crate) fn lower_member_set(&mut self, set: &StructMemberSet) -> BackendResult<bool> {
        let value = self.lower_rvalue(&set.value)?;
        let (member_ptr, _) = self.lower_member_address(&set.target)?;
        self.backend.build_store(value, member_ptr)?;
        Ok(false)
    }
}
