//! Stdlib-knowledge SSA rewrite.
//!
//! A comma-ok receive from a `time.Tick` channel never yields
//! `ok == false` (the channel never closes), so a branch on that `ok`
//! is dead. The rewrite replaces the conditional branch with an
//! unconditional jump to the ok=true successor and unlinks the dead
//! edge. This is the only SSA mutation in the system and runs before
//! the init barrier; applying it twice is a no-op.

use lockhound_ir::ir::{Callee, Function, InstrKind, Instruction, SsaProgram, UnOpKind};

/// Apply the rewrite to every function with a body.
pub fn apply_stdlib_knowledge(ssa: &mut SsaProgram) {
    let names: Vec<String> = ssa.functions.iter().map(|f| f.name.clone()).collect();
    for func in &mut ssa.functions {
        if func.blocks.is_empty() {
            continue;
        }
        rewrite_tick_branches(func, &names);
    }
}

fn rewrite_tick_branches(func: &mut Function, names: &[String]) {
    let hits = find_tick_branches(func, names);
    for (block, if_index) in hits {
        let dropped = func.blocks[block].succs[1];
        func.blocks[block].instrs[if_index] = Instruction {
            name: String::new(),
            kind: InstrKind::Jump,
            span: None,
        };
        func.blocks[block].succs.truncate(1);
        let this = func.blocks[block].index;
        func.blocks[dropped as usize].preds.retain(|&p| p != this);
    }
}

/// Blocks ending in a two-way branch on the ok component of a Tick
/// receive, with the raw index of the `If` to replace.
fn find_tick_branches(func: &Function, names: &[String]) -> Vec<(usize, usize)> {
    let mut hits = Vec::new();

    for (b, block) in func.blocks.iter().enumerate() {
        if block.instrs.len() < 3 {
            continue;
        }
        if block.succs.len() != 2 {
            continue;
        }

        let indices: Vec<usize> = block
            .instrs
            .iter()
            .enumerate()
            .filter(|(_, ins)| !matches!(ins.kind, InstrKind::DebugRef))
            .map(|(i, _)| i)
            .collect();

        for w in 0..indices.len() {
            let recv = &block.instrs[indices[w]];
            let x = match &recv.kind {
                InstrKind::UnOp {
                    op: UnOpKind::Recv,
                    x,
                } => x,
                _ => continue,
            };
            if !is_tick_call(func, names, x) {
                continue;
            }

            let Some(&ex_index) = indices.get(w + 1) else {
                continue;
            };
            let extract = &block.instrs[ex_index];
            match &extract.kind {
                InstrKind::Extract { tuple, index: 1 } if tuple == &recv.name => {}
                _ => continue,
            }

            let Some(&if_index) = indices.get(w + 2) else {
                continue;
            };
            match &block.instrs[if_index].kind {
                InstrKind::If { cond } if cond == &extract.name => {}
                _ => continue,
            }

            hits.push((b, if_index));
            break;
        }
    }

    hits
}

/// Is `register` defined by a static call to `time.Tick`?
fn is_tick_call(func: &Function, names: &[String], register: &str) -> bool {
    if register.is_empty() {
        return false;
    }
    for block in &func.blocks {
        for ins in &block.instrs {
            if ins.name != register {
                continue;
            }
            let InstrKind::Call(call) = &ins.kind else {
                return false;
            };
            return match call.callee {
                Callee::Static(id) | Callee::Closure(id) => names[id] == "time.Tick",
                _ => false,
            };
        }
    }
    false
}
