//! Expression lowering.
//!
//! Each routine pushes exactly one value onto the operand stack:
//! - scalars push the value itself (`int` is `i32`, `string` is `i8*`);
//! - struct-typed expressions push the address of their aggregate;
//! - calls to `void` functions push the call instruction, which consumers
//!   discard.

pub mod binary_ops;
pub mod calls;
pub mod ident;
pub mod literals;
pub mod member_access;
pub mod struct_literal;

use overcast_ast::Expr;

use crate::backend::{Backend, BackendResult};

impl<B: Backend> crate::codegen::CodeGen<B> {
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> BackendResult<()> {
        let depth = self.env.operand_depth();
        match expr {
            Expr::StringLiteral(text) => self.lower_string_literal(text)?,
            Expr::IntLiteral(value) => self.lower_int_literal(*value)?,
            Expr::Variable(name) => self.lower_variable(name)?,
            Expr::InvokeFunction(call) => self.lower_call(call)?,
            Expr::Binary(binary) => self.lower_binary(binary)?,
            Expr::StructObjCreation(creation) => self.lower_struct_literal(creation)?,
            Expr::StructMemberAccess(access) => self.lower_member_access(access)?,
            Expr::Reference(inner) => self.lower_reference(inner)?,
        }
        debug_assert_eq!(self.env.operand_depth(), depth + 1);
        Ok(())
    }
}
