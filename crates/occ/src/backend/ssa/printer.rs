//! LLVM-style textual rendering of an SSA [`Module`].

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use super::{Function, InstId, InstKind, Module, TypeId, TypeKind, Value};

pub(super) fn type_name(module: &Module, ty: TypeId) -> String {
    match module.type_kind(ty) {
        TypeKind::Void => "void".to_string(),
        TypeKind::Int(bits) => format!("i{bits}"),
        TypeKind::Float => "float".to_string(),
        TypeKind::Ptr(_) => "ptr".to_string(),
        TypeKind::Struct { name, .. } => format!("%{name}"),
    }
}

/// Printable names for one function's values, made unique the way LLVM
/// does it: a repeated name gets a numeric suffix, unnamed results get
/// sequential numbers.
struct Names {
    insts: HashMap<InstId, String>,
}

impl Names {
    fn assign(module: &Module, function: &Function) -> Self {
        let mut taken: HashMap<String, usize> = HashMap::new();
        for index in 0..function.params.len() {
            taken.insert(format!("arg{index}"), 0);
        }
        let mut insts = HashMap::new();
        let mut unnamed = 0usize;
        for block in &function.blocks {
            for id in &block.insts {
                let inst = function.inst(*id);
                if matches!(module.type_kind(inst.ty), TypeKind::Void) {
                    continue;
                }
                let name = if inst.name.is_empty() {
                    unnamed += 1;
                    format!("{}", unnamed - 1)
                } else {
                    match taken.get_mut(&inst.name) {
                        Some(count) => {
                            *count += 1;
                            format!("{}{}", inst.name, count)
                        }
                        None => {
                            taken.insert(inst.name.clone(), 0);
                            inst.name.clone()
                        }
                    }
                };
                insts.insert(*id, name);
            }
        }
        Self { insts }
    }
}

fn operand(module: &Module, names: &Names, value: Value) -> String {
    match value {
        Value::ConstInt { ty, value } => {
            if matches!(module.type_kind(ty), TypeKind::Int(1)) {
                let text = if value != 0 { "true" } else { "false" };
                text.to_string()
            } else {
                value.to_string()
            }
        }
        Value::Param { index, .. } => format!("%arg{index}"),
        Value::Inst { id, .. } => match names.insts.get(&id) {
            Some(name) => format!("%{name}"),
            None => "<dead>".to_string(),
        },
        Value::Global(id) => format!("@{}", module.globals[id.0].name),
    }
}

fn typed(module: &Module, names: &Names, value: Value) -> String {
    format!(
        "{} {}",
        type_name(module, module.value_type(value)),
        operand(module, names, value)
    )
}

fn signature(module: &Module, function: &Function) -> String {
    let mut params: Vec<String> = function
        .params
        .iter()
        .map(|ty| type_name(module, *ty))
        .collect();
    if function.variadic {
        params.push("...".to_string());
    }
    params.join(", ")
}

fn instruction(module: &Module, function: &Function, names: &Names, id: InstId) -> String {
    let inst = function.inst(id);
    let result = names
        .insts
        .get(&id)
        .map(|name| format!("%{name} = "))
        .unwrap_or_default();
    let body = match &inst.kind {
        InstKind::Alloca { allocated } => format!("alloca {}", type_name(module, *allocated)),
        InstKind::Store { value, ptr } => format!(
            "store {}, {}",
            typed(module, names, *value),
            typed(module, names, *ptr)
        ),
        InstKind::Load { ptr } => format!(
            "load {}, {}",
            type_name(module, inst.ty),
            typed(module, names, *ptr)
        ),
        InstKind::Call { callee, args, tail } => {
            let target = &module.functions[callee.0];
            let args: Vec<String> = args.iter().map(|arg| typed(module, names, *arg)).collect();
            let ret = type_name(module, target.ret);
            let callee_ty = if target.variadic {
                format!("{ret} ({})", signature(module, target))
            } else {
                ret
            };
            format!(
                "{}call {callee_ty} @{}({})",
                if *tail { "tail " } else { "" },
                target.name,
                args.join(", ")
            )
        }
        InstKind::Binary { op, lhs, rhs } => format!(
            "{} {}, {}",
            op.mnemonic(),
            typed(module, names, *lhs),
            operand(module, names, *rhs)
        ),
        InstKind::ICmp { pred, lhs, rhs } => format!(
            "icmp {} {}, {}",
            pred.mnemonic(),
            typed(module, names, *lhs),
            operand(module, names, *rhs)
        ),
        InstKind::StructGep {
            struct_ty,
            ptr,
            index,
        } => format!(
            "getelementptr inbounds {}, {}, i32 0, i32 {index}",
            type_name(module, *struct_ty),
            typed(module, names, *ptr)
        ),
        InstKind::CondBr {
            cond,
            then_dest,
            else_dest,
        } => format!(
            "br {}, label %{}, label %{}",
            typed(module, names, *cond),
            function.blocks[*then_dest].name,
            function.blocks[*else_dest].name
        ),
        InstKind::Br { dest } => format!("br label %{}", function.blocks[*dest].name),
        InstKind::Ret { value: Some(value) } => format!("ret {}", typed(module, names, *value)),
        InstKind::Ret { value: None } => "ret void".to_string(),
        InstKind::Unreachable => "unreachable".to_string(),
    };
    format!("{result}{body}")
}

fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::new();
    for byte in bytes {
        match byte {
            b' '..=b'~' if *byte != b'"' && *byte != b'\\' => out.push(*byte as char),
            _ => {
                let _ = write!(out, "\\{byte:02X}");
            }
        }
    }
    out
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        writeln!(f, "source_filename = \"{}\"", self.name)?;

        let structs: Vec<_> = self
            .types
            .iter()
            .filter_map(|kind| match kind {
                TypeKind::Struct { name, members } => Some((name, members)),
                _ => None,
            })
            .collect();
        if !structs.is_empty() {
            writeln!(f)?;
        }
        for (name, members) in structs {
            let members: Vec<String> = members.iter().map(|ty| type_name(self, *ty)).collect();
            writeln!(f, "%{name} = type {{ {} }}", members.join(", "))?;
        }

        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        for global in &self.globals {
            writeln!(
                f,
                "@{} = private unnamed_addr constant [{} x i8] c\"{}\"",
                global.name,
                global.bytes.len(),
                escape_bytes(&global.bytes)
            )?;
        }

        for function in &self.functions {
            writeln!(f)?;
            let ret = type_name(self, function.ret);
            if function.is_declaration() {
                writeln!(
                    f,
                    "declare {ret} @{}({})",
                    function.name,
                    signature(self, function)
                )?;
                continue;
            }
            let names = Names::assign(self, function);
            let params: Vec<String> = function
                .params
                .iter()
                .enumerate()
                .map(|(index, ty)| format!("{} %arg{index}", type_name(self, *ty)))
                .collect();
            writeln!(f, "define {ret} @{}({}) {{", function.name, params.join(", "))?;
            for (index, block) in function.blocks.iter().enumerate() {
                if index > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "{}:", block.name)?;
                for id in &block.insts {
                    writeln!(f, "  {}", instruction(self, function, &names, *id))?;
                }
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}
