//! Statement lowering helpers
//!
//! Every routine returns `Ok(true)` when it emitted a terminator for the
//! current block. Callers stop lowering the rest of that block, so no
//! instruction is ever appended after a `ret` or `br`.

pub mod block;
pub mod control_flow;
pub mod decl;
pub mod expr_stmt;
pub mod return_stmt;

use overcast_ast::Stmt;

use crate::backend::{Backend, BackendResult};

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Lower a sequence of statements into the current block.
    pub(crate) fn lower_stmts(&mut self, stmts: &[Stmt]) -> BackendResult<bool> {
        for (index, stmt) in stmts.iter().enumerate() {
            if self.lower_stmt(stmt)? {
                let skipped = stmts.len() - index - 1;
                if skipped > 0 {
                    log::debug!("skipping {skipped} unreachable statement(s)");
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) -> BackendResult<bool> {
        log::trace!("lowering {}", stmt.kind_name());
        match stmt {
            Stmt::FunctionDeclaration(decl) => {
                self.gen_function_ir(decl)?;
                Ok(false)
            }
            Stmt::StructDeclaration(decl) => {
                self.gen_struct_type(decl)?;
                Ok(false)
            }
            Stmt::VariableDeclaration(decl) => self.lower_var_decl(decl),
            Stmt::VariableSet(set) => self.lower_var_set(set),
            Stmt::StructMemberSet(set) => self.lower_member_set(set),
            Stmt::If(if_stmt) => self.lower_if_stmt(if_stmt),
            Stmt::Return(ret) => self.lower_return(ret),
            Stmt::Expression(expr) => self.lower_expr_stmt(expr),
            Stmt::Block(block) => self.lower_block(block),
        }
    }
}
