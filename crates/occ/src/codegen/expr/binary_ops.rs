use overcast_ast::{BinaryExpr, BinaryOp};

use crate::backend::{Backend, BackendResult, IntBinOp};

fn int_op(op: BinaryOp) -> IntBinOp {
    match op {
        BinaryOp::Add => IntBinOp::Add,
        BinaryOp::Sub => IntBinOp::Sub,
        BinaryOp::Mul => IntBinOp::Mul,
        BinaryOp::Div => IntBinOp::SDiv,
    }
}

impl<B: Backend> crate::codegen::CodeGen<B> {
    /// Same evaluation order as `if` conditions: right operand first.
    pub(crate) fn lower_binary(&mut self, binary: &BinaryExpr) -> BackendResult<()> {
        self.lower_expr(&binary.rhs)?;
        self.lower_expr(&binary.lhs)?;
        let lhs = self.env.pop()?;
        let rhs = self.env.pop()?;
        let result = self
            .backend
            .build_int_binary(int_op(binary.op), lhs, rhs, "arithmetic")?;
        self.env.push(result);
        Ok(())
    }
}
