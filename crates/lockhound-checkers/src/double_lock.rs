//! SA2005 — double lock.
//!
//! Collects every lock acquisition in the user's functions, groups them
//! by lock key, and decides for each ordered pair whether an execution
//! exists that acquires the second lock while the first is still held.
//! Cross-block reasoning is reachability over the block graph; the
//! cross-function case walks the call graph (skipping goroutine
//! launches) and recurses on the call site of the first edge.

use std::collections::BTreeMap;

use lockhound_ir::bb_graph::BbCallGraph;
use lockhound_ir::calls::{is_lock_call, is_unlock_call, lock_prefix, LockKey};
use lockhound_ir::ir::{display_span, BasicBlock, CallSite, FuncId, InstrKind, InstrRef, SsaProgram};

use crate::checker::{Checker, Job};

pub fn check_double_lock(checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    let mut lock_instructions: BTreeMap<LockKey, Vec<InstrRef>> = BTreeMap::new();
    for &func in &ssa.initial {
        for (key, instrs) in collect_lock_instrs(ssa, func) {
            lock_instructions.entry(key).or_default().extend(instrs);
        }
    }

    for (key, instrs) in &lock_instructions {
        for i in 0..instrs.len() {
            for t in i..instrs.len() {
                let first = instrs[i];
                let second = instrs[t];

                if is_double_lock(checker, ssa, first, second, key) {
                    let name = short_name_of(ssa, first);
                    let po1 = display_span(ssa.instr(first).span.as_ref());
                    let po = display_span(ssa.instr(second).span.as_ref());
                    job.report(
                        "SA2005",
                        ssa.instr(first).span.as_ref(),
                        format!("Acquiring the {name} again at {po}, {po1}"),
                    );
                }

                if first != second && is_double_lock(checker, ssa, second, first, key) {
                    let name = short_name_of(ssa, second);
                    let po = display_span(ssa.instr(first).span.as_ref());
                    job.report(
                        "SA2005",
                        ssa.instr(second).span.as_ref(),
                        format!("Acquiring the {name} again at {po} "),
                    );
                }
            }
        }
    }
}

fn as_call(ssa: &SsaProgram, r: InstrRef) -> Option<&CallSite> {
    match &ssa.instr(r).kind {
        InstrKind::Call(call) => Some(call),
        _ => None,
    }
}

fn short_name_of(ssa: &SsaProgram, r: InstrRef) -> String {
    as_call(ssa, r)
        .map(|call| ssa.short_call_name(call))
        .unwrap_or_default()
}

/// All lock acquisitions of one function, grouped by lock key.
pub fn collect_lock_instrs(ssa: &SsaProgram, func: FuncId) -> BTreeMap<LockKey, Vec<InstrRef>> {
    let mut result: BTreeMap<LockKey, Vec<InstrRef>> = BTreeMap::new();

    for block in &ssa.functions[func].blocks {
        for (index, ins) in block.instrs.iter().enumerate() {
            let InstrKind::Call(call) = &ins.kind else {
                continue;
            };
            if is_lock_call(ssa, call) {
                result.entry(lock_prefix(call)).or_default().push(InstrRef {
                    func,
                    block: block.index,
                    index: index as u32,
                });
            }
        }
    }

    result
}

/// Does `second` acquire the key while `first` still holds it?
fn is_double_lock(
    checker: &Checker,
    ssa: &SsaProgram,
    first: InstrRef,
    second: InstrRef,
    key: &str,
) -> bool {
    let Some(f_call) = as_call(ssa, first) else {
        return false;
    };
    let Some(s_call) = as_call(ssa, second) else {
        return false;
    };
    // Different lock methods (Lock vs RLock) are not double-locking.
    if ssa.short_call_name(f_call) != ssa.short_call_name(s_call) {
        return false;
    }

    let f_fn = first.func;
    let s_fn = second.func;

    let mut bg = BbCallGraph::new(&ssa.functions[f_fn]);
    let mut found = false;

    if f_fn == s_fn && first.block == second.block {
        if is_lock_to_lock_in_same_block(ssa, first, second) {
            found = true;
        }

        // A single lock statement re-executed by a loop.
        if !found && checker.is_in_loop(f_fn, first.block) {
            found = find_path(ssa, &mut bg, f_fn, first.block, second.block, key);
        }
    } else if f_fn == s_fn {
        found = find_path(ssa, &mut bg, f_fn, first.block, second.block, key);
    }

    if !found {
        let path = checker
            .descs()
            .call_graph()
            .path_search_ignoring_go(f_fn, &|other| other == s_fn);

        // A source matching the predicate yields an empty path; only a
        // real call chain counts.
        if let Some(path) = path {
            if !path.is_empty() {
                if is_unlock_before_lock(ssa, s_fn, second.block, key) {
                    // The callee releases the key before re-acquiring.
                    return false;
                }

                let site = path[0].site;
                if !matches!(ssa.instr(site).kind, InstrKind::Call(_)) {
                    return false;
                }

                // Treat the call site that leaves f_fn as the second
                // lock for the intra-function leg.
                if first.block == site.block {
                    if is_lock_to_lock_in_same_block(ssa, first, site) {
                        return true;
                    }
                } else {
                    return find_path(ssa, &mut bg, f_fn, first.block, site.block, key);
                }
            }
        }
    }

    found
}

/// Within one block: does `first` precede `second` with no unlock of
/// `first`'s key in between? Returns false for the same instruction.
fn is_lock_to_lock_in_same_block(ssa: &SsaProgram, first: InstrRef, second: InstrRef) -> bool {
    let Some(f_call) = as_call(ssa, first) else {
        return false;
    };
    let f_prefix = lock_prefix(f_call);
    let block = ssa.block(first.func, first.block);

    let mut f_index: i64 = -1;
    let mut s_index: i64 = -1;

    for (index, ins) in block.instrs.iter().enumerate() {
        let InstrKind::Call(call) = &ins.kind else {
            continue;
        };

        if index as u32 == first.index {
            f_index = index as i64;
        }

        if is_unlock_call(ssa, call) && lock_prefix(call) == f_prefix {
            let unlock_index = index as i64;
            // An unlock between a seen lock and the not-yet-seen other
            // lock interrupts the pair.
            if (f_index < unlock_index && s_index == -1 && f_index != -1)
                || (s_index < unlock_index && f_index == -1 && s_index != -1)
            {
                return false;
            }
        }

        if index as u32 == second.index {
            s_index = index as i64;
        }
    }

    f_index < s_index
}

/// Does the last unlock of `key` in the block precede the last lock of
/// `key`? Requires both to be present.
fn is_unlock_before_lock(ssa: &SsaProgram, func: FuncId, block: u32, key: &str) -> bool {
    let mut lock_index = None;
    let mut unlock_index = None;

    for (index, ins) in ssa.block(func, block).instrs.iter().enumerate() {
        let InstrKind::Call(call) = &ins.kind else {
            continue;
        };
        if is_unlock_call(ssa, call) && lock_prefix(call) == key {
            unlock_index = Some(index);
        }
        if is_lock_call(ssa, call) && lock_prefix(call) == key {
            lock_index = Some(index);
        }
    }

    matches!((unlock_index, lock_index), (Some(u), Some(l)) if u < l)
}

/// A block survives the path search unless it unlocks `key` before any
/// lock of `key`; instructions after a lock of `key` are irrelevant.
fn block_survives(ssa: &SsaProgram, block: &BasicBlock, key: &str) -> bool {
    for ins in &block.instrs {
        let InstrKind::Call(call) = &ins.kind else {
            continue;
        };
        if is_unlock_call(ssa, call) && lock_prefix(call) == key {
            return false;
        }
        if is_lock_call(ssa, call) && lock_prefix(call) == key {
            break;
        }
    }
    true
}

/// Is there a path from `f_block` to `s_block` on which `key` stays
/// held?
fn find_path(
    ssa: &SsaProgram,
    bg: &mut BbCallGraph,
    func: FuncId,
    f_block: u32,
    s_block: u32,
    key: &str,
) -> bool {
    let f_node = bg.create_bb_node(f_block);
    let s_node = bg.create_bb_node(s_block);

    // The first block already releases the key: nothing to search.
    let mut needed = true;
    for ins in &ssa.block(func, f_block).instrs {
        if let InstrKind::Call(call) = &ins.kind {
            if is_unlock_call(ssa, call) && lock_prefix(call) == key {
                needed = false;
            }
        }
    }

    // The second block protects itself by unlocking first.
    if is_unlock_before_lock(ssa, func, s_block, key) {
        needed = false;
    }

    if needed {
        let path = bg.lock_path_search(f_node, s_node, &|bb| block_survives(ssa, bb, key));
        if !path.is_empty() {
            return true;
        }
    }

    false
}
