use overcast_ast::Expr;

use crate::backend::{Backend, BackendResult};

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Evaluates `expr` for its effects and drops the result.
    pub(crate) fn lower_expr_stmt(&mut self, expr: &Expr) -> BackendResult<bool> {
        let _ = self.lower_operand(expr)?;
        Ok(false)
    }
}
