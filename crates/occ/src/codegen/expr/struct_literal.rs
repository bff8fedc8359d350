use overcast_ast::StructObjCreation;

use crate::backend::{Backend, BackendResult};
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// `[Name]{a, b}`: a fresh aggregate slot with one store per member, in
    /// argument order.
    pub(crate) fn lower_struct_literal(&mut self, creation: &StructObjCreation) -> BackendResult<()> {
        let name = &creation.struct_name;
        let struct_ty = self.env.struct_type(name)?;
        let member_count = self.env.layout(name)?.len();
        if creation.args.len() != member_count {
            return Err(CodeGenError::Unsupported(format!(
                "a `{name}` literal with {} value(s) for {member_count} member(s)",
                creation.args.len()
            )));
        }

        let slot = self
            .backend
            .build_entry_alloca(struct_ty, &format!("struct_{name}Instance"))?;
        for (index, arg) in creation.args.iter().enumerate() {
            let value = self.lower_rvalue(arg)?;
            let index = u32::try_from(index)
                .map_err(|_| CodeGenError::backend("struct literal is too large"))?;
            let member_ptr = self
                .backend
                .build_struct_gep(struct_ty, slot, index, "struct_memberGEP")?;
            self.backend.build_store(value, member_ptr)?;
        }
        self.env.push(slot);
        Ok(())
    }
}
