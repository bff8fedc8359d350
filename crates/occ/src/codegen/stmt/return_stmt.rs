use overcast_ast::ReturnStmt;

use crate::backend::{Backend, BackendResult};
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    pub(crate) fn lower_return(&mut self, ret: &ReturnStmt) -> BackendResult<bool> {
        let Some(return_type) = self.env.current_return.clone() else {
            return Err(CodeGenError::Unsupported("return outside of a function".to_string()));
        };
        if return_type.is_void() {
            // `return f()` with a void `f`: evaluate, then return nothing.
            let _ = self.lower_operand(&ret.value)?;
            self.backend.build_return_void()?;
        } else {
            let value = self.lower_rvalue(&ret.value)?;
            self.backend.build_return(Some(value))?;
        }
        Ok(true)
    }
}
