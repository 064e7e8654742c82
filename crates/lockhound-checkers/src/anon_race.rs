//! SA2006 — data races between anonymous goroutines.
//!
//! Builds a per-function block reachability map, then flags pairs of
//! anonymous functions launched as goroutines that capture the same
//! variable when both launch sites can execute in one run. This is a
//! coarse syntactic check; it reports through the regular sink.

use fixedbitset::FixedBitSet;

use lockhound_ir::calls::unwrap_function;
use lockhound_ir::ir::{FuncId, Function, InstrKind, Span, SsaProgram};

use crate::checker::{Checker, Job};

/// For every block, the set of blocks reachable from it (including
/// itself).
pub fn map_reachable_blocks(func: &Function) -> Vec<FixedBitSet> {
    let n = func.blocks.len();
    let mut map = Vec::with_capacity(n);

    for start in 0..n {
        let mut reachable = FixedBitSet::with_capacity(n);
        let mut work = vec![start];
        while let Some(block) = work.pop() {
            if reachable.contains(block) {
                continue;
            }
            reachable.insert(block);
            for &succ in &func.blocks[block].succs {
                work.push(succ as usize);
            }
        }
        map.push(reachable);
    }

    map
}

/// A goroutine launch of an anonymous function: the launch block and
/// the launched function.
fn anon_launches(ssa: &SsaProgram, parent: FuncId) -> Vec<(u32, FuncId, Option<Span>)> {
    let func = &ssa.functions[parent];
    let mut launches = Vec::new();

    for block in &func.blocks {
        for ins in &block.instrs {
            let InstrKind::Go(go) = &ins.kind else {
                continue;
            };
            let Some(target) = unwrap_function(&go.callee) else {
                continue;
            };
            if !func.anon_funcs.contains(&target) {
                continue;
            }
            launches.push((block.index, target, ins.span.clone()));
        }
    }

    launches
}

/// A captured variable shared by two anonymous goroutines whose launch
/// sites can both execute. Returns the report message and a position.
fn has_anon_race(
    ssa: &SsaProgram,
    parent: FuncId,
    reachability: &[FixedBitSet],
) -> Option<(String, Option<Span>)> {
    let launches = anon_launches(ssa, parent);

    for (i, &(block_a, func_a, _)) in launches.iter().enumerate() {
        for &(block_b, func_b, ref span_b) in &launches[i + 1..] {
            let connected = block_a == block_b
                || reachability[block_a as usize].contains(block_b as usize)
                || reachability[block_b as usize].contains(block_a as usize);
            if !connected {
                continue;
            }

            let vars_a = &ssa.functions[func_a].free_vars;
            let shared = ssa.functions[func_b]
                .free_vars
                .iter()
                .find(|v| vars_a.contains(*v));
            if let Some(var) = shared {
                return Some((
                    format!(
                        "anonymous functions started as goroutines both capture {var}; \
                         accesses may race"
                    ),
                    span_b.clone(),
                ));
            }
        }
    }

    None
}

pub fn check_anon_race(_checker: &Checker, job: &mut Job) {
    let ssa = &job.program.ssa;

    for &func in &ssa.initial {
        if ssa.functions[func].name.ends_with(".init") {
            continue;
        }

        let reachability = map_reachable_blocks(&ssa.functions[func]);
        if let Some((message, span)) = has_anon_race(ssa, func, &reachability) {
            job.report("SA2006", span.as_ref(), message);
        }
    }
}
