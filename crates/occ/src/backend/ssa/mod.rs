//! In-crate SSA backend; the default when occ is built without the `llvm` feature.
//!
//! A typed, LLVM-flavoured IR kept entirely in memory: named struct types,
//! private string constants, functions made of basic blocks, and
//! instructions stored in a per-function arena. Pointers are typed so the
//! builder can reject loads and stores through the wrong pointee. The
//! textual form printed by [`Module`]'s `Display` impl mirrors LLVM
//! assembly closely enough to be read by anyone who knows it.

mod passes;
mod printer;
mod verify;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use super::{Backend, BackendResult, IntBinOp, IntPredicate};
use crate::error::CodeGenError;

pub use passes::KNOWN_PASSES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    func: FuncId,
    index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalId(usize);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Int(u32),
    Float,
    Ptr(TypeId),
    Struct { name: String, members: Vec<TypeId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    ConstInt { ty: TypeId, value: i64 },
    Param { func: FuncId, index: usize },
    Inst { func: FuncId, id: InstId },
    Global(GlobalId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstKind {
    Alloca { allocated: TypeId },
    Store { value: Value, ptr: Value },
    Load { ptr: Value },
    Call { callee: FuncId, args: Vec<Value>, tail: bool },
    Binary { op: IntBinOp, lhs: Value, rhs: Value },
    ICmp { pred: IntPredicate, lhs: Value, rhs: Value },
    StructGep { struct_ty: TypeId, ptr: Value, index: u32 },
    CondBr { cond: Value, then_dest: usize, else_dest: usize },
    Br { dest: usize },
    Ret { value: Option<Value> },
    Unreachable,
}

impl InstKind {
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::CondBr { .. } | InstKind::Br { .. } | InstKind::Ret { .. } | InstKind::Unreachable
        )
    }

    /// No side effects and no memory access: safe to dedupe or drop.
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            InstKind::Binary { .. } | InstKind::ICmp { .. } | InstKind::StructGep { .. }
        )
    }

    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Alloca { .. } | InstKind::Br { .. } | InstKind::Unreachable => Vec::new(),
            InstKind::Store { value, ptr } => vec![*value, *ptr],
            InstKind::Load { ptr } => vec![*ptr],
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Binary { lhs, rhs, .. } | InstKind::ICmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstKind::StructGep { ptr, .. } => vec![*ptr],
            InstKind::CondBr { cond, .. } => vec![*cond],
            InstKind::Ret { value } => value.iter().copied().collect(),
        }
    }

    fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            InstKind::Alloca { .. } | InstKind::Br { .. } | InstKind::Unreachable => Vec::new(),
            InstKind::Store { value, ptr } => vec![value, ptr],
            InstKind::Load { ptr } => vec![ptr],
            InstKind::Call { args, .. } => args.iter_mut().collect(),
            InstKind::Binary { lhs, rhs, .. } | InstKind::ICmp { lhs, rhs, .. } => vec![lhs, rhs],
            InstKind::StructGep { ptr, .. } => vec![ptr],
            InstKind::CondBr { cond, .. } => vec![cond],
            InstKind::Ret { value } => value.iter_mut().collect(),
        }
    }

    pub fn successors(&self) -> Vec<usize> {
        match self {
            InstKind::CondBr {
                then_dest,
                else_dest,
                ..
            } => vec![*then_dest, *else_dest],
            InstKind::Br { dest } => vec![*dest],
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub kind: InstKind,
    /// Result type; `void` for instructions without a result.
    pub ty: TypeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub name: String,
    pub insts: Vec<InstId>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: FuncId,
    pub name: String,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub variadic: bool,
    pub blocks: Vec<BasicBlock>,
    insts: Vec<Instruction>,
}

impl Function {
    /// Declarations have no body.
    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn inst(&self, id: InstId) -> &Instruction {
        &self.insts[id.0]
    }

    pub fn block(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|block| block.name == name)
    }

    pub fn block_instructions<'a>(
        &'a self,
        block: &'a BasicBlock,
    ) -> impl Iterator<Item = &'a Instruction> + 'a {
        block.insts.iter().map(|id| self.inst(*id))
    }

    /// Live instructions in layout order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.insts.iter().map(|id| self.inst(*id)))
    }

    pub fn value_of(&self, id: InstId) -> Value {
        Value::Inst { func: self.id, id }
    }

    fn push_inst(&mut self, inst: Instruction) -> InstId {
        self.insts.push(inst);
        InstId(self.insts.len() - 1)
    }

    fn unique_block_name(&self, base: &str) -> String {
        if self.block(base).is_none() {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| self.block(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    fn live_ids(&self) -> impl Iterator<Item = InstId> + '_ {
        self.blocks.iter().flat_map(|block| block.insts.iter().copied())
    }

    /// Rewrites every operand equal to `from` into `to`.
    fn replace_all_uses(&mut self, from: Value, to: Value) {
        let live: Vec<InstId> = self.live_ids().collect();
        for id in live {
            for operand in self.insts[id.0].kind.operands_mut() {
                if *operand == from {
                    *operand = to;
                }
            }
        }
    }

    fn remove_insts(&mut self, dead: &HashSet<InstId>) {
        if dead.is_empty() {
            return;
        }
        for block in &mut self.blocks {
            block.insts.retain(|id| !dead.contains(id));
        }
    }

    fn use_counts(&self) -> HashMap<InstId, usize> {
        let mut counts = HashMap::new();
        for inst in self.instructions() {
            for operand in inst.kind.operands() {
                if let Value::Inst { func, id } = operand
                    && func == self.id
                {
                    *counts.entry(id).or_insert(0) += 1;
                }
            }
        }
        counts
    }
}

/// A private, NUL-terminated byte constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    types: Vec<TypeKind>,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
    string_ty: TypeId,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        let mut module = Self {
            name: name.into(),
            types: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            string_ty: TypeId(0),
        };
        let i8_ty = module.intern(TypeKind::Int(8));
        module.string_ty = module.intern(TypeKind::Ptr(i8_ty));
        module
    }

    /// Structural types are shared; each struct declaration is its own type.
    fn intern(&mut self, kind: TypeKind) -> TypeId {
        if !matches!(kind, TypeKind::Struct { .. })
            && let Some(index) = self.types.iter().position(|existing| *existing == kind)
        {
            return TypeId(index);
        }
        self.types.push(kind);
        TypeId(self.types.len() - 1)
    }

    pub fn type_kind(&self, ty: TypeId) -> &TypeKind {
        &self.types[ty.0]
    }

    pub fn struct_type(&self, name: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|kind| matches!(kind, TypeKind::Struct { name: n, .. } if n == name))
            .map(TypeId)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    pub fn value_type(&self, value: Value) -> TypeId {
        match value {
            Value::ConstInt { ty, .. } => ty,
            Value::Param { func, index } => self.functions[func.0].params[index],
            Value::Inst { func, id } => self.functions[func.0].inst(id).ty,
            Value::Global(_) => self.string_ty,
        }
    }

    fn pointee(&self, ty: TypeId) -> Option<TypeId> {
        match self.type_kind(ty) {
            TypeKind::Ptr(pointee) => Some(*pointee),
            _ => None,
        }
    }

    fn int_bits(&self, ty: TypeId) -> Option<u32> {
        match self.type_kind(ty) {
            TypeKind::Int(bits) => Some(*bits),
            _ => None,
        }
    }
}

pub struct SsaBackend {
    module: Module,
    cursor: Option<BlockId>,
}

impl SsaBackend {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module: Module::new(module_name),
            cursor: None,
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    fn describe(&self, ty: TypeId) -> String {
        printer::type_name(&self.module, ty)
    }

    fn cursor(&self) -> BackendResult<BlockId> {
        self.cursor.ok_or(CodeGenError::NoInsertionPoint)
    }

    fn append(&mut self, kind: InstKind, ty: TypeId, name: &str) -> BackendResult<Value> {
        let cursor = self.cursor()?;
        let function = &mut self.module.functions[cursor.func.0];
        let block = &function.blocks[cursor.index];
        if let Some(last) = block.insts.last()
            && function.inst(*last).kind.is_terminator()
        {
            return Err(CodeGenError::backend(format!(
                "instruction appended after the terminator of block `{}` in `{}`",
                block.name, function.name
            )));
        }
        let id = function.push_inst(Instruction {
            kind,
            ty,
            name: name.to_string(),
        });
        function.blocks[cursor.index].insts.push(id);
        Ok(Value::Inst {
            func: cursor.func,
            id,
        })
    }

    fn void(&mut self) -> TypeId {
        self.module.intern(TypeKind::Void)
    }

    fn expect_same_type(&self, what: &str, lhs: Value, rhs: Value) -> BackendResult<TypeId> {
        let lt = self.module.value_type(lhs);
        let rt = self.module.value_type(rhs);
        if lt != rt {
            return Err(CodeGenError::backend(format!(
                "{what} operand types differ: {} vs {}",
                self.describe(lt),
                self.describe(rt)
            )));
        }
        if self.module.int_bits(lt).is_none() {
            return Err(CodeGenError::backend(format!(
                "{what} requires integer operands, got {}",
                self.describe(lt)
            )));
        }
        Ok(lt)
    }

    fn block_in_current_function(&self, block: BlockId) -> BackendResult<usize> {
        let cursor = self.cursor()?;
        if cursor.func != block.func {
            return Err(CodeGenError::backend("branch target belongs to another function"));
        }
        Ok(block.index)
    }
}

impl Backend for SsaBackend {
    type Type = TypeId;
    type Value = Value;
    type Function = FuncId;
    type Block = BlockId;

    fn void_type(&mut self) -> TypeId {
        self.void()
    }

    fn int_type(&mut self, bits: u32) -> TypeId {
        self.module.intern(TypeKind::Int(bits))
    }

    fn float_type(&mut self) -> TypeId {
        self.module.intern(TypeKind::Float)
    }

    fn pointer_type(&mut self, pointee: TypeId) -> TypeId {
        self.module.intern(TypeKind::Ptr(pointee))
    }

    fn opaque_struct_type(&mut self, name: &str) -> BackendResult<TypeId> {
        if self.module.struct_type(name).is_some() {
            return Err(CodeGenError::backend(format!("struct type `%{name}` already exists")));
        }
        Ok(self.module.intern(TypeKind::Struct {
            name: name.to_string(),
            members: Vec::new(),
        }))
    }

    fn set_struct_body(&mut self, ty: TypeId, members: &[TypeId]) -> BackendResult<()> {
        let described = self.describe(ty);
        match &mut self.module.types[ty.0] {
            TypeKind::Struct { members: body, .. } if body.is_empty() => {
                body.extend_from_slice(members);
                Ok(())
            }
            TypeKind::Struct { .. } => Err(CodeGenError::backend(format!(
                "body of `{described}` was already set"
            ))),
            _ => Err(CodeGenError::backend(format!("`{described}` is not a struct type"))),
        }
    }

    fn add_function(
        &mut self,
        name: &str,
        params: &[TypeId],
        ret: TypeId,
        variadic: bool,
    ) -> BackendResult<FuncId> {
        if self.module.function(name).is_some() {
            return Err(CodeGenError::backend(format!("function `@{name}` already exists")));
        }
        let id = FuncId(self.module.functions.len());
        self.module.functions.push(Function {
            id,
            name: name.to_string(),
            params: params.to_vec(),
            ret,
            variadic,
            blocks: Vec::new(),
            insts: Vec::new(),
        });
        Ok(id)
    }

    fn function_param(&self, function: FuncId, index: u32) -> BackendResult<Value> {
        let index = index as usize;
        let f = &self.module.functions[function.0];
        if index >= f.params.len() {
            return Err(CodeGenError::backend(format!(
                "`@{}` has no parameter {index}",
                f.name
            )));
        }
        Ok(Value::Param {
            func: function,
            index,
        })
    }

    fn append_block(&mut self, function: FuncId, name: &str) -> BlockId {
        let f = &mut self.module.functions[function.0];
        let name = f.unique_block_name(name);
        f.blocks.push(BasicBlock {
            name,
            insts: Vec::new(),
        });
        BlockId {
            func: function,
            index: f.blocks.len() - 1,
        }
    }

    fn position_at_end(&mut self, block: BlockId) {
        self.cursor = Some(block);
    }

    fn current_function(&self) -> Option<FuncId> {
        self.cursor.map(|cursor| cursor.func)
    }

    fn current_block_terminated(&self) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };
        let f = &self.module.functions[cursor.func.0];
        f.blocks[cursor.index]
            .insts
            .last()
            .is_some_and(|id| f.inst(*id).kind.is_terminator())
    }

    fn build_entry_alloca(&mut self, ty: TypeId, name: &str) -> BackendResult<Value> {
        let cursor = self.cursor()?;
        let ptr_ty = self.pointer_type(ty);
        let f = &mut self.module.functions[cursor.func.0];
        if f.blocks.is_empty() {
            return Err(CodeGenError::NoInsertionPoint);
        }
        let id = f.push_inst(Instruction {
            kind: InstKind::Alloca { allocated: ty },
            ty: ptr_ty,
            name: name.to_string(),
        });
        let at = f.blocks[0]
            .insts
            .iter()
            .take_while(|existing| matches!(f.insts[existing.0].kind, InstKind::Alloca { .. }))
            .count();
        f.blocks[0].insts.insert(at, id);
        Ok(f.value_of(id))
    }

    fn build_store(&mut self, value: Value, ptr: Value) -> BackendResult<()> {
        let value_ty = self.module.value_type(value);
        let ptr_ty = self.module.value_type(ptr);
        match self.module.pointee(ptr_ty) {
            Some(pointee) if pointee == value_ty => {}
            _ => {
                return Err(CodeGenError::backend(format!(
                    "cannot store {} through {}",
                    self.describe(value_ty),
                    self.describe(ptr_ty)
                )));
            }
        }
        let void = self.void();
        self.append(InstKind::Store { value, ptr }, void, "")?;
        Ok(())
    }

    fn build_load(&mut self, ty: TypeId, ptr: Value, name: &str) -> BackendResult<Value> {
        let ptr_ty = self.module.value_type(ptr);
        if self.module.pointee(ptr_ty) != Some(ty) {
            return Err(CodeGenError::backend(format!(
                "cannot load {} through {}",
                self.describe(ty),
                self.describe(ptr_ty)
            )));
        }
        self.append(InstKind::Load { ptr }, ty, name)
    }

    fn build_call(&mut self, function: FuncId, args: &[Value], name: &str) -> BackendResult<Value> {
        let callee = &self.module.functions[function.0];
        let arity_ok = if callee.variadic {
            args.len() >= callee.params.len()
        } else {
            args.len() == callee.params.len()
        };
        if !arity_ok {
            return Err(CodeGenError::backend(format!(
                "`@{}` called with {} argument(s), expects {}",
                callee.name,
                args.len(),
                callee.params.len()
            )));
        }
        for (index, (param, arg)) in callee.params.iter().zip(args).enumerate() {
            let arg_ty = self.module.value_type(*arg);
            if *param != arg_ty {
                return Err(CodeGenError::backend(format!(
                    "argument {index} of `@{}` is {}, expected {}",
                    callee.name,
                    self.describe(arg_ty),
                    self.describe(*param)
                )));
            }
        }
        let ret = callee.ret;
        self.append(
            InstKind::Call {
                callee: function,
                args: args.to_vec(),
                tail: false,
            },
            ret,
            name,
        )
    }

    fn build_int_binary(
        &mut self,
        op: IntBinOp,
        lhs: Value,
        rhs: Value,
        name: &str,
    ) -> BackendResult<Value> {
        let ty = self.expect_same_type(op.mnemonic(), lhs, rhs)?;
        self.append(InstKind::Binary { op, lhs, rhs }, ty, name)
    }

    fn build_int_compare(
        &mut self,
        pred: IntPredicate,
        lhs: Value,
        rhs: Value,
        name: &str,
    ) -> BackendResult<Value> {
        self.expect_same_type("icmp", lhs, rhs)?;
        let i1 = self.int_type(1);
        self.append(InstKind::ICmp { pred, lhs, rhs }, i1, name)
    }

    fn build_cond_br(
        &mut self,
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    ) -> BackendResult<()> {
        let cond_ty = self.module.value_type(cond);
        if self.module.int_bits(cond_ty) != Some(1) {
            return Err(CodeGenError::backend(format!(
                "branch condition must be i1, got {}",
                self.describe(cond_ty)
            )));
        }
        let then_dest = self.block_in_current_function(then_block)?;
        let else_dest = self.block_in_current_function(else_block)?;
        let void = self.void();
        self.append(
            InstKind::CondBr {
                cond,
                then_dest,
                else_dest,
            },
            void,
            "",
        )?;
        Ok(())
    }

    fn build_br(&mut self, dest: BlockId) -> BackendResult<()> {
        let dest = self.block_in_current_function(dest)?;
        let void = self.void();
        self.append(InstKind::Br { dest }, void, "")?;
        Ok(())
    }

    fn build_return(&mut self, value: Option<Value>) -> BackendResult<()> {
        let void = self.void();
        self.append(InstKind::Ret { value }, void, "")?;
        Ok(())
    }

    fn build_unreachable(&mut self) -> BackendResult<()> {
        let void = self.void();
        self.append(InstKind::Unreachable, void, "")?;
        Ok(())
    }

    fn build_struct_gep(
        &mut self,
        struct_ty: TypeId,
        ptr: Value,
        index: u32,
        name: &str,
    ) -> BackendResult<Value> {
        let member = match self.module.type_kind(struct_ty) {
            TypeKind::Struct { members, .. } => members.get(index as usize).copied(),
            _ => None,
        };
        let Some(member) = member else {
            return Err(CodeGenError::backend(format!(
                "no member {index} in {}",
                self.describe(struct_ty)
            )));
        };
        let ptr_ty = self.module.value_type(ptr);
        if self.module.pointee(ptr_ty) != Some(struct_ty) {
            return Err(CodeGenError::backend(format!(
                "getelementptr into {} through {}",
                self.describe(struct_ty),
                self.describe(ptr_ty)
            )));
        }
        let result = self.pointer_type(member);
        self.append(
            InstKind::StructGep {
                struct_ty,
                ptr,
                index,
            },
            result,
            name,
        )
    }

    fn build_global_string(&mut self, text: &str, name: &str) -> BackendResult<Value> {
        let base = if name.is_empty() { ".str" } else { name };
        let name = match self.module.globals.len() {
            0 => base.to_string(),
            n => format!("{base}.{n}"),
        };
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.module.globals.push(Global { name, bytes });
        Ok(Value::Global(GlobalId(self.module.globals.len() - 1)))
    }

    fn const_int(&mut self, ty: TypeId, value: i64) -> BackendResult<Value> {
        if self.module.int_bits(ty).is_none() {
            return Err(CodeGenError::backend(format!(
                "integer constant of non-integer type {}",
                self.describe(ty)
            )));
        }
        Ok(Value::ConstInt { ty, value })
    }

    fn verify_function(&self, function: FuncId) -> BackendResult<()> {
        let f = &self.module.functions[function.0];
        verify::verify_function(&self.module, f)
            .map_err(|message| CodeGenError::verification(f.name.clone(), message))
    }

    fn optimize_function(&mut self, function: FuncId) -> BackendResult<()> {
        passes::fold_function(&mut self.module, function);
        Ok(())
    }

    fn run_pass(&mut self, pass: &str) -> BackendResult<()> {
        passes::run_pass(&mut self.module, pass).map_err(CodeGenError::backend)
    }

    fn print_to_string(&self) -> String {
        self.module.to_string()
    }

    fn write_to_file(&self, path: &Path) -> BackendResult<()> {
        std::fs::write(path, self.print_to_string()).map_err(|err| {
            CodeGenError::backend(format!("failed to write `{}`: {err}", path.display()))
        })
    }
}
