use overcast_ast::Block;

use crate::backend::{Backend, BackendResult};

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Blocks share the enclosing function's locals.
    pub(crate) fn lower_block(&mut self, block: &Block) -> BackendResult<bool> {
        self.lower_stmts(&block.stmts)
    }
}
