use overcast_ast::InvokeFunction;

use crate::backend::{Backend, BackendResult};
use crate::codegen::helpers::is_aggregate;
use crate::error::CodeGenError;

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Arguments are evaluated left to right and passed by value. A struct
    /// result is spilled to a fresh slot whose address is pushed.
    pub(crate) fn lower_call(&mut self, call: &InvokeFunction) -> BackendResult<()> {
        let entry = self.env.function(&call.name)?;
        let (function, return_type, variadic) =
            (entry.value, entry.return_type.clone(), entry.variadic);
        let declared = entry.params.len();
        if call.args.len() < declared || (!variadic && call.args.len() > declared) {
            return Err(CodeGenError::Unsupported(format!(
                "a call to `{}` with {} argument(s)",
                call.name,
                call.args.len()
            )));
        }

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.lower_rvalue(arg)?);
        }

        let name = if return_type.is_void() { "" } else { "calltmp" };
        let result = self.backend.build_call(function, &args, name)?;
        if is_aggregate(&return_type) {
            let storage_ty = self.backend_type(&return_type)?;
            let slot = self
                .backend
                .build_entry_alloca(storage_ty, &format!("{}_result", call.name))?;
            self.backend.build_store(result, slot)?;
            self.env.push(slot);
        } else {
            self.env.push(result);
        }
        Ok(())
    }
}
