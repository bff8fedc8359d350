//! Module passes for the SSA backend.
//!
//! Each pass works on one function at a time and keeps the function valid:
//! uses are rewritten before the instruction that produced them is removed.

use std::collections::{HashMap, HashSet};

use super::{FuncId, Function, InstId, InstKind, Module, TypeId, TypeKind, Value};
use crate::backend::{IntBinOp, IntPredicate};

pub const KNOWN_PASSES: [&str; 5] = ["tailcallelim", "mem2reg", "gvn", "instcombine", "early-cse"];

type Pass = fn(&mut Function, &[TypeKind]);

pub(super) fn run_pass(module: &mut Module, name: &str) -> Result<(), String> {
    let pass: Pass = match name {
        "tailcallelim" => mark_tail_calls,
        "mem2reg" => promote_allocas,
        "gvn" => number_values,
        "instcombine" => combine_instructions,
        "early-cse" => eliminate_common_subexpressions,
        other => return Err(format!("unknown pass `{other}`")),
    };
    let Module {
        types, functions, ..
    } = module;
    for function in functions.iter_mut().filter(|f| !f.is_declaration()) {
        log::trace!("running {name} on @{}", function.name);
        pass(function, types);
    }
    Ok(())
}

/// Constant folding for a single function.
pub(super) fn fold_function(module: &mut Module, function: FuncId) {
    let Module {
        types, functions, ..
    } = module;
    if let Some(f) = functions.get_mut(function.0)
        && !f.is_declaration()
    {
        combine_instructions(f, types);
    }
}

/// Whether the address of a stack slot, or of a member inside one, is passed
/// to a call or stored to memory.
fn frame_escapes(function: &Function) -> bool {
    let mut frame: HashSet<Value> = HashSet::new();
    loop {
        let before = frame.len();
        for id in function.live_ids() {
            let derived = match &function.inst(id).kind {
                InstKind::Alloca { .. } => true,
                InstKind::StructGep { ptr, .. } => frame.contains(ptr),
                _ => false,
            };
            if derived {
                frame.insert(function.value_of(id));
            }
        }
        if frame.len() == before {
            break;
        }
    }
    function.live_ids().any(|id| match &function.inst(id).kind {
        InstKind::Store { value, .. } => frame.contains(value),
        InstKind::Call { args, .. } => args.iter().any(|arg| frame.contains(arg)),
        _ => false,
    })
}

/// Marks a call as `tail` when the block returns its result right after it.
///
/// A callee may not read the caller's frame through a `tail` call, so no call
/// is marked in a function whose slots escape.
fn mark_tail_calls(function: &mut Function, types: &[TypeKind]) {
    if frame_escapes(function) {
        log::trace!("@{} passes stack addresses; no tail calls", function.name);
        return;
    }
    for block_index in 0..function.blocks.len() {
        let insts = &function.blocks[block_index].insts;
        let [.., call_id, ret_id] = insts[..] else {
            continue;
        };
        let returned = match &function.inst(ret_id).kind {
            InstKind::Ret { value } => *value,
            _ => continue,
        };
        let call = function.inst(call_id);
        let InstKind::Call { .. } = call.kind else {
            continue;
        };
        let call_value = function.value_of(call_id);
        let in_tail_position = match returned {
            Some(value) => value == call_value,
            None => matches!(types[call.ty.0], TypeKind::Void),
        };
        if in_tail_position && let InstKind::Call { tail, .. } = &mut function.insts[call_id.0].kind {
            *tail = true;
        }
    }
}

/// Where each live instruction sits: (block, position).
fn layout(function: &Function) -> HashMap<InstId, (usize, usize)> {
    let mut positions = HashMap::new();
    for (block_index, block) in function.blocks.iter().enumerate() {
        for (pos, id) in block.insts.iter().enumerate() {
            positions.insert(*id, (block_index, pos));
        }
    }
    positions
}

enum SlotUse {
    Load(InstId),
    Store(InstId, Value),
}

/// Promotes stack slots that are only loaded from and stored to.
///
/// Two shapes are handled without inserting phi nodes: a slot stored once
/// in the entry block and only read after that store, and a slot whose
/// every access sits in a single block and begins with a store.
fn promote_allocas(function: &mut Function, _types: &[TypeKind]) {
    let Some(entry) = function.blocks.first() else {
        return;
    };
    let allocas: Vec<InstId> = entry
        .insts
        .iter()
        .copied()
        .filter(|id| matches!(function.inst(*id).kind, InstKind::Alloca { .. }))
        .collect();

    for alloca in allocas {
        let slot = function.value_of(alloca);
        let positions = layout(function);
        let mut uses = Vec::new();
        let mut escapes = false;
        for block in &function.blocks {
            for id in &block.insts {
                match &function.inst(*id).kind {
                    InstKind::Load { ptr } if *ptr == slot => uses.push(SlotUse::Load(*id)),
                    InstKind::Store { value, ptr } if *ptr == slot && *value != slot => {
                        uses.push(SlotUse::Store(*id, *value))
                    }
                    kind => {
                        if kind.operands().contains(&slot) {
                            escapes = true;
                        }
                    }
                }
            }
        }
        if escapes {
            continue;
        }

        let stores: Vec<(InstId, Value)> = uses
            .iter()
            .filter_map(|u| match u {
                SlotUse::Store(id, value) => Some((*id, *value)),
                SlotUse::Load(_) => None,
            })
            .collect();
        let loads: Vec<InstId> = uses
            .iter()
            .filter_map(|u| match u {
                SlotUse::Load(id) => Some(*id),
                SlotUse::Store(..) => None,
            })
            .collect();
        if stores.is_empty() {
            continue;
        }

        let mut replacements: Vec<(InstId, Value)> = Vec::new();
        if let [(store, value)] = stores[..]
            && positions[&store].0 == 0
            && loads.iter().all(|load| {
                let (block, pos) = positions[load];
                block != 0 || pos > positions[&store].1
            })
        {
            replacements.extend(loads.iter().map(|load| (*load, value)));
        } else {
            let blocks: HashSet<usize> = uses
                .iter()
                .map(|u| match u {
                    SlotUse::Load(id) | SlotUse::Store(id, _) => positions[id].0,
                })
                .collect();
            if blocks.len() != 1 {
                continue;
            }
            let mut current: Option<Value> = None;
            let mut resolved: HashMap<Value, Value> = HashMap::new();
            let mut promotable = true;
            for u in &uses {
                match u {
                    SlotUse::Store(_, value) => {
                        current = Some(resolved.get(value).copied().unwrap_or(*value));
                    }
                    SlotUse::Load(id) => match current {
                        Some(value) => {
                            resolved.insert(function.value_of(*id), value);
                            replacements.push((*id, value));
                        }
                        None => {
                            promotable = false;
                            break;
                        }
                    },
                }
            }
            if !promotable {
                continue;
            }
        }

        for (load, value) in &replacements {
            let from = function.value_of(*load);
            function.replace_all_uses(from, *value);
        }
        let mut dead: HashSet<InstId> = loads.into_iter().collect();
        dead.extend(stores.iter().map(|(id, _)| *id));
        dead.insert(alloca);
        function.remove_insts(&dead);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ExprKey {
    Binary(IntBinOp, Value, Value),
    ICmp(IntPredicate, Value, Value),
    Gep(TypeId, Value, u32),
}

fn expr_key(kind: &InstKind) -> Option<ExprKey> {
    match kind {
        InstKind::Binary { op, lhs, rhs } => Some(ExprKey::Binary(*op, *lhs, *rhs)),
        InstKind::ICmp { pred, lhs, rhs } => Some(ExprKey::ICmp(*pred, *lhs, *rhs)),
        InstKind::StructGep {
            struct_ty,
            ptr,
            index,
        } => Some(ExprKey::Gep(*struct_ty, *ptr, *index)),
        _ => None,
    }
}

/// Deduplicates pure expressions. Values computed in the entry block are
/// available everywhere since it dominates every other block; other values
/// are only reused within their own block.
fn number_values(function: &mut Function, _types: &[TypeKind]) {
    let mut dominating: HashMap<ExprKey, Value> = HashMap::new();
    let mut dead = HashSet::new();
    for block_index in 0..function.blocks.len() {
        let mut local: HashMap<ExprKey, Value> = HashMap::new();
        let ids = function.blocks[block_index].insts.clone();
        for id in ids {
            let Some(key) = expr_key(&function.inst(id).kind) else {
                continue;
            };
            match dominating.get(&key).or_else(|| local.get(&key)) {
                Some(existing) => {
                    let from = function.value_of(id);
                    function.replace_all_uses(from, *existing);
                    dead.insert(id);
                }
                None => {
                    let value = function.value_of(id);
                    if block_index == 0 {
                        dominating.insert(key, value);
                    } else {
                        local.insert(key, value);
                    }
                }
            }
        }
    }
    function.remove_insts(&dead);
}

/// Block-local CSE plus redundant load elimination and store-to-load
/// forwarding. Any store or call invalidates what is known about memory.
fn eliminate_common_subexpressions(function: &mut Function, _types: &[TypeKind]) {
    let mut dead = HashSet::new();
    for block_index in 0..function.blocks.len() {
        let mut exprs: HashMap<ExprKey, Value> = HashMap::new();
        let mut memory: HashMap<Value, Value> = HashMap::new();
        let ids = function.blocks[block_index].insts.clone();
        for id in ids {
            let kind = function.inst(id).kind.clone();
            let this = function.value_of(id);
            match kind {
                InstKind::Load { ptr } => match memory.get(&ptr) {
                    Some(known) => {
                        function.replace_all_uses(this, *known);
                        dead.insert(id);
                    }
                    None => {
                        memory.insert(ptr, this);
                    }
                },
                InstKind::Store { value, ptr } => {
                    memory.clear();
                    memory.insert(ptr, value);
                }
                InstKind::Call { .. } => memory.clear(),
                other => {
                    if let Some(key) = expr_key(&other) {
                        match exprs.get(&key) {
                            Some(existing) => {
                                function.replace_all_uses(this, *existing);
                                dead.insert(id);
                            }
                            None => {
                                exprs.insert(key, this);
                            }
                        }
                    }
                }
            }
        }
    }
    function.remove_insts(&dead);
}

/// Sign-extends the low `bits` of `value`.
fn wrap(value: i128, bits: u32) -> i64 {
    if bits >= 64 {
        return value as i64;
    }
    let shift = 128 - bits;
    ((value << shift) >> shift) as i64
}

fn fold_binary(op: IntBinOp, lhs: i64, rhs: i64, bits: u32) -> Option<i64> {
    let (l, r) = (lhs as i128, rhs as i128);
    let raw = match op {
        IntBinOp::Add => l + r,
        IntBinOp::Sub => l - r,
        IntBinOp::Mul => l * r,
        IntBinOp::SDiv => {
            let min = -(1i128 << (bits.max(1) - 1));
            if r == 0 || (l == min && r == -1) {
                return None;
            }
            l / r
        }
    };
    Some(wrap(raw, bits))
}

fn is_const(value: Value, expected: i64) -> bool {
    matches!(value, Value::ConstInt { value, .. } if value == expected)
}

/// Constant folding, algebraic identities and removal of unused pure
/// instructions, loads and write-only slots.
fn combine_instructions(function: &mut Function, types: &[TypeKind]) {
    let ids: Vec<InstId> = function.live_ids().collect();
    let mut dead = HashSet::new();
    for id in ids {
        let inst = function.inst(id);
        let ty = inst.ty;
        let replacement = match inst.kind {
            InstKind::Binary { op, lhs, rhs } => {
                let bits = match types[ty.0] {
                    TypeKind::Int(bits) => bits,
                    _ => continue,
                };
                match (op, lhs, rhs) {
                    (_, Value::ConstInt { value: l, .. }, Value::ConstInt { value: r, .. }) => {
                        fold_binary(op, l, r, bits).map(|value| Value::ConstInt { ty, value })
                    }
                    (IntBinOp::Add | IntBinOp::Sub, x, zero) if is_const(zero, 0) => Some(x),
                    (IntBinOp::Add, zero, x) if is_const(zero, 0) => Some(x),
                    (IntBinOp::Mul | IntBinOp::SDiv, x, one) if is_const(one, 1) => Some(x),
                    (IntBinOp::Mul, one, x) if is_const(one, 1) => Some(x),
                    (IntBinOp::Mul, _, zero) | (IntBinOp::Mul, zero, _) if is_const(zero, 0) => {
                        Some(Value::ConstInt { ty, value: 0 })
                    }
                    _ => None,
                }
            }
            InstKind::ICmp { pred, lhs, rhs } => match (lhs, rhs) {
                (Value::ConstInt { value: l, .. }, Value::ConstInt { value: r, .. }) => {
                    Some(Value::ConstInt {
                        ty,
                        value: pred.evaluate(l, r) as i64,
                    })
                }
                _ => None,
            },
            _ => None,
        };
        if let Some(value) = replacement {
            let from = function.value_of(id);
            function.replace_all_uses(from, value);
            dead.insert(id);
        }
    }
    function.remove_insts(&dead);
    remove_dead_code(function);
}

fn remove_dead_code(function: &mut Function) {
    loop {
        let counts = function.use_counts();
        let mut dead = HashSet::new();
        for id in function.live_ids() {
            let kind = &function.inst(id).kind;
            let unused = counts.get(&id).copied().unwrap_or(0) == 0;
            if unused && (kind.is_pure() || matches!(kind, InstKind::Load { .. })) {
                dead.insert(id);
            }
        }
        // Slots that are written but never read.
        for id in function.live_ids() {
            if !matches!(function.inst(id).kind, InstKind::Alloca { .. }) {
                continue;
            }
            let slot = function.value_of(id);
            let mut stores = Vec::new();
            let mut read = false;
            for other in function.live_ids() {
                match &function.inst(other).kind {
                    InstKind::Store { value, ptr } if *ptr == slot && *value != slot => {
                        stores.push(other)
                    }
                    kind if kind.operands().contains(&slot) => read = true,
                    _ => {}
                }
            }
            if !read {
                dead.insert(id);
                dead.extend(stores);
            }
        }
        if dead.is_empty() {
            break;
        }
        function.remove_insts(&dead);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_sign_extends() {
        assert_eq!(wrap(i32::MAX as i128 + 1, 32), i32::MIN as i64);
        assert_eq!(wrap(-1, 32), -1);
        assert_eq!(wrap(1, 1), -1);
    }

    #[test]
    fn division_is_not_folded_when_undefined() {
        assert_eq!(fold_binary(IntBinOp::SDiv, 7, 0, 32), None);
        assert_eq!(fold_binary(IntBinOp::SDiv, i32::MIN as i64, -1, 32), None);
        assert_eq!(fold_binary(IntBinOp::SDiv, -7, 2, 32), Some(-3));
        assert_eq!(fold_binary(IntBinOp::Mul, 1 << 20, 1 << 20, 32), Some(0));
    }
}
