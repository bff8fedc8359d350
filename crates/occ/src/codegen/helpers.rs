//! Code generation environment and small shared helpers.
//!
//! The [`Environment`] holds every table the lowering routines consult:
//! declared functions and struct types (module lifetime) plus the locals,
//! struct-alloca table and operand stack of the function being lowered
//! (cleared when its body finishes).

use std::collections::HashMap;

use overcast_ast::{Expr, OcType, StructLayout};

use crate::backend::{Backend, BackendResult};
use crate::error::CodeGenError;
use crate::types::to_backend_type;

/// Stack slot of a local variable or parameter.
pub struct LocalSlot<B: Backend> {
    pub ty: OcType,
    pub storage_ty: B::Type,
    pub slot: B::Value,
}

pub struct FunctionEntry<B: Backend> {
    pub value: B::Function,
    pub params: Vec<OcType>,
    pub return_type: OcType,
    pub variadic: bool,
}

pub struct Environment<B: Backend> {
    pub(crate) functions: HashMap<String, FunctionEntry<B>>,
    pub(crate) struct_types: HashMap<String, B::Type>,
    pub(crate) struct_layouts: HashMap<String, StructLayout>,
    pub(crate) locals: HashMap<String, LocalSlot<B>>,
    /// Variables whose current value lives in an aggregate slot, mapped to
    /// that slot's address.
    pub(crate) struct_allocas: HashMap<String, B::Value>,
    pub(crate) current_function: Option<String>,
    pub(crate) current_return: Option<OcType>,
    operands: Vec<B::Value>,
}

impl<B: Backend> Default for Environment<B> {
    fn default() -> Self {
        Self {
            functions: HashMap::new(),
            struct_types: HashMap::new(),
            struct_layouts: HashMap::new(),
            locals: HashMap::new(),
            struct_allocas: HashMap::new(),
            current_function: None,
            current_return: None,
            operands: Vec::new(),
        }
    }
}

impl<B: Backend> Environment<B> {
    pub fn push(&mut self, value: B::Value) {
        self.operands.push(value);
    }

    pub fn pop(&mut self) -> BackendResult<B::Value> {
        self.operands.pop().ok_or(CodeGenError::OperandStackUnderflow)
    }

    pub fn operand_depth(&self) -> usize {
        self.operands.len()
    }

    pub fn local(&self, name: &str) -> BackendResult<&LocalSlot<B>> {
        self.locals
            .get(name)
            .ok_or_else(|| CodeGenError::UnknownVariable(name.to_string()))
    }

    pub fn function(&self, name: &str) -> BackendResult<&FunctionEntry<B>> {
        self.functions
            .get(name)
            .ok_or_else(|| CodeGenError::UnknownFunction(name.to_string()))
    }

    pub fn layout(&self, struct_name: &str) -> BackendResult<&StructLayout> {
        self.struct_layouts
            .get(struct_name)
            .ok_or_else(|| CodeGenError::UnknownStruct(struct_name.to_string()))
    }

    pub fn struct_type(&self, struct_name: &str) -> BackendResult<B::Type> {
        self.struct_types
            .get(struct_name)
            .copied()
            .ok_or_else(|| CodeGenError::UnknownStruct(struct_name.to_string()))
    }

    /// Resets the per-function tables and returns how many operands were
    /// left behind.
    pub fn clear_function_state(&mut self) -> usize {
        self.locals.clear();
        self.struct_allocas.clear();
        self.current_function = None;
        self.current_return = None;
        let residue = self.operands.len();
        self.operands.clear();
        residue
    }

    /// Position of `member` in `struct_name` as a GEP index.
    pub fn member_index(&self, struct_name: &str, member: &str) -> BackendResult<(u32, OcType)> {
        let layout = self.layout(struct_name)?;
        let unknown = || CodeGenError::UnknownMember {
            struct_name: struct_name.to_string(),
            member: member.to_string(),
        };
        let index = layout.index_of(member).ok_or_else(unknown)?;
        let ty = layout.member(member).ok_or_else(unknown)?.ty.clone();
        let index = u32::try_from(index).map_err(|_| unknown())?;
        Ok((index, ty))
    }

    /// Static type of an already bound expression, from the code generator's
    /// own tables.
    pub fn expr_type(&self, expr: &Expr) -> BackendResult<OcType> {
        match expr {
            Expr::StringLiteral(_) => Ok(OcType::string()),
            Expr::IntLiteral(_) => Ok(OcType::int()),
            Expr::Variable(name) => Ok(self.local(name)?.ty.clone()),
            Expr::InvokeFunction(call) => Ok(self.function(&call.name)?.return_type.clone()),
            Expr::Binary(binary) => self.expr_type(&binary.lhs),
            Expr::StructObjCreation(creation) => Ok(OcType::identifier(&creation.struct_name)),
            Expr::StructMemberAccess(access) => {
                let object_ty = self.expr_type(&access.object)?;
                let (_, ty) = self.member_index(object_ty.base_name(), &access.member)?;
                Ok(ty)
            }
            Expr::Reference(inner) => Ok(OcType::pointer(self.expr_type(inner)?)),
        }
    }
}

/// Whether values of `ty` are carried as aggregate addresses on the operand
/// stack.
pub(crate) fn is_aggregate(ty: &OcType) -> bool {
    ty.struct_name().is_some()
}

impl<B: Backend> super::CodeGen<B> {
    pub(crate) fn backend_type(&mut self, ty: &OcType) -> BackendResult<B::Type> {
        to_backend_type(&mut self.backend, &self.env.struct_types, ty)
    }

    /// Lowers `expr` and pops its value.
    pub(crate) fn lower_operand(&mut self, expr: &Expr) -> BackendResult<B::Value> {
        self.lower_expr(expr)?;
        self.env.pop()
    }

    /// Lowers `expr` to a first-class value: aggregates are loaded out of
    /// their slot, everything else is taken as pushed.
    pub(crate) fn lower_rvalue(&mut self, expr: &Expr) -> BackendResult<B::Value> {
        let ty = self.env.expr_type(expr)?;
        let value = self.lower_operand(expr)?;
        if !is_aggregate(&ty) {
            return Ok(value);
        }
        let storage_ty = self.backend_type(&ty)?;
        self.backend.build_load(storage_ty, value, "struct_copy")
    }
}
