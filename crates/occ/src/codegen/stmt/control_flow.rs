use overcast_ast::{Comparison, IfStmt};

use crate::backend::{Backend, BackendResult, IntPredicate};
use crate::error::CodeGenError;

fn predicate(op: Comparison) -> IntPredicate {
    match op {
        Comparison::Gt => IntPredicate::Sgt,
        Comparison::Lt => IntPredicate::Slt,
        Comparison::Ge => IntPredicate::Sge,
        Comparison::Le => IntPredicate::Sle,
        Comparison::Eq => IntPredicate::Eq,
        Comparison::Ne => IntPredicate::Ne,
    }
}

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// `then`, `else` and `ifcont` are always created, even without an else
    /// branch. Afterwards the builder sits at `ifcont`.
    ///
    /// An arm only branches to `ifcont` when it falls through. If both arms
    /// end in a terminator, `ifcont` has no predecessors and is closed with
    /// `unreachable`.
    pub(crate) fn lower_if_stmt(&mut self, if_stmt: &IfStmt) -> BackendResult<bool> {
        // Right operand first; the left one ends up on top of the stack.
        self.lower_expr(&if_stmt.rhs)?;
        self.lower_expr(&if_stmt.lhs)?;
        let lhs = self.env.pop()?;
        let rhs = self.env.pop()?;
        let cond = self
            .backend
            .build_int_compare(predicate(if_stmt.op), lhs, rhs, "ifcond")?;

        let function = self
            .backend
            .current_function()
            .ok_or(CodeGenError::NoInsertionPoint)?;
        let then_bb = self.backend.append_block(function, "then");
        let else_bb = self.backend.append_block(function, "else");
        let merge_bb = self.backend.append_block(function, "ifcont");
        self.backend.build_cond_br(cond, then_bb, else_bb)?;

        self.backend.position_at_end(then_bb);
        let then_terminated = self.lower_block(&if_stmt.then_block)?;
        if !then_terminated {
            self.backend.build_br(merge_bb)?;
        }

        self.backend.position_at_end(else_bb);
        let else_terminated = match &if_stmt.else_block {
            Some(block) => self.lower_block(block)?,
            None => false,
        };
        if !else_terminated {
            self.backend.build_br(merge_bb)?;
        }

        self.backend.position_at_end(merge_bb);
        // Nothing branches here when both arms terminated.
        if then_terminated && else_terminated {
            self.backend.build_unreachable()?;
        }
        Ok(then_terminated && else_terminated)
    }
}
