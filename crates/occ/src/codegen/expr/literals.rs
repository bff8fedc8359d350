use overcast_ast::OcType;

use crate::backend::{Backend, BackendResult};

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// A private NUL-terminated global; the expression is its address.
    pub(crate) fn lower_string_literal(&mut self, text: &str) -> BackendResult<()> {
        let ptr = self.backend.build_global_string(text, "str_tmp")?;
        self.env.push(ptr);
        Ok(())
    }

    pub(crate) fn lower_int_literal(&mut self, value: i32) -> BackendResult<()> {
        let int_ty = self.backend_type(&OcType::int())?;
        let constant = self.backend.const_int(int_ty, i64::from(value))?;
        self.env.push(constant);
        Ok(())
    }
}
