//! Member access through struct values and pointers to structs.
//!
//! The object's address is the pushed aggregate slot for a struct value, the
//! loaded pointer for `S*`, and one further load per extra pointer layer.

use overcast_ast::{MemberAccess, OcType};

use crate::backend::{Backend, BackendResult};
use crate::codegen::helpers::is_aggregate;
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Address of `object -> member` and the member's declared type.
    pub(crate) fn lower_member_address(
        &mut self,
        access: &MemberAccess,
    ) -> BackendResult<(B::Value, OcType)> {
        let object_ty = self.env.expr_type(&access.object)?;
        let struct_name = object_ty.base_name().to_string();
        let mut ptr = self.lower_operand(&access.object)?;

        let mut current = object_ty;
        while current.pointer_depth() > 1 {
            let pointee = current
                .pointee()
                .cloned()
                .ok_or_else(|| CodeGenError::UnknownType(current.to_string()))?;
            let pointee_ty = self.backend_type(&pointee)?;
            ptr = self.backend.build_load(pointee_ty, ptr, "deref")?;
            current = pointee;
        }

        let struct_ty = self.env.struct_type(&struct_name)?;
        let (index, member_ty) = self.env.member_index(&struct_name, &access.member)?;
        let member_ptr = self
            .backend
            .build_struct_gep(struct_ty, ptr, index, "struct_memberGEP")?;
        Ok((member_ptr, member_ty))
    }

    pub(crate) fn lower_member_access(&mut self, access: &MemberAccess) -> BackendResult<()> {
        let (member_ptr, member_ty) = self.lower_member_address(access)?;
        if is_aggregate(&member_ty) {
            self.env.push(member_ptr);
            return Ok(());
        }
        let storage_ty = self.backend_type(&member_ty)?;
        let value = self
            .backend
            .build_load(storage_ty, member_ptr, &format!("member_{}", access.member))?;
        self.env.push(value);
        Ok(())
    }
}
