//! Structural checks on a finished function.

use std::collections::HashSet;

use super::{Function, InstKind, Module, TypeKind, Value};
use super::printer::type_name;

pub(super) fn verify_function(module: &Module, function: &Function) -> Result<(), String> {
    if function.is_declaration() {
        return Ok(());
    }
    let live: HashSet<_> = function.live_ids().collect();
    let returns_void = matches!(module.type_kind(function.ret), TypeKind::Void);

    for block in &function.blocks {
        let Some((last, body)) = block.insts.split_last() else {
            return Err(format!(
                "Basic Block in function '{}' does not have terminator!\nlabel %{}",
                function.name, block.name
            ));
        };
        if !function.inst(*last).kind.is_terminator() {
            return Err(format!(
                "Basic Block in function '{}' does not have terminator!\nlabel %{}",
                function.name, block.name
            ));
        }
        if body.iter().any(|id| function.inst(*id).kind.is_terminator()) {
            return Err(format!(
                "Terminator found in the middle of a basic block!\nlabel %{}",
                block.name
            ));
        }

        for id in &block.insts {
            let inst = function.inst(*id);
            for dest in inst.kind.successors() {
                if dest >= function.blocks.len() {
                    return Err(format!("branch in %{} to a missing block", block.name));
                }
                if dest == 0 {
                    return Err("Entry block to function must not have predecessors!".to_string());
                }
            }
            if let InstKind::Ret { value } = &inst.kind {
                match (value, returns_void) {
                    (None, true) => {}
                    (Some(value), false) if module.value_type(*value) == function.ret => {}
                    _ => {
                        return Err(format!(
                            "Function return type does not match operand type of return inst!\n  in %{} of '{}', expected {}",
                            block.name,
                            function.name,
                            type_name(module, function.ret)
                        ));
                    }
                }
            }
            for operand in inst.kind.operands() {
                match operand {
                    Value::Inst { func, id: used } => {
                        if func != function.id {
                            return Err(format!(
                                "Referring to an instruction in another function!\n  in %{}",
                                block.name
                            ));
                        }
                        if !live.contains(&used) {
                            return Err(format!(
                                "Instruction referencing instruction not embedded in a basic block!\n  in %{}",
                                block.name
                            ));
                        }
                    }
                    Value::Param { func, index } => {
                        if func != function.id || index >= function.params.len() {
                            return Err(format!("Referring to an argument in another function!\n  in %{}", block.name));
                        }
                    }
                    Value::ConstInt { .. } | Value::Global(_) => {}
                }
            }
        }
    }
    Ok(())
}
