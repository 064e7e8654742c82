//! Precomputed per-function facts: loop sets and the call graph.
//!
//! Built once during init, before the stdlib-knowledge rewrite, and
//! immutable afterward. Loops are natural loops found from CFG back
//! edges; each is a sorted set of block indices.

use fixedbitset::FixedBitSet;

use crate::call_graph::CallGraph;
use crate::ir::{FuncId, Function, SsaProgram};

/// A loop: the set of blocks it comprises, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop {
    pub blocks: Vec<u32>,
}

impl Loop {
    pub fn contains(&self, block: u32) -> bool {
        self.blocks.binary_search(&block).is_ok()
    }
}

pub struct FuncDescriptions {
    loops: Vec<Vec<Loop>>,
    call_graph: CallGraph,
}

impl FuncDescriptions {
    pub fn new(ssa: &SsaProgram) -> Self {
        let loops = ssa.functions.iter().map(find_loops).collect();
        Self {
            loops,
            call_graph: CallGraph::build(ssa),
        }
    }

    pub fn loops(&self, func: FuncId) -> &[Loop] {
        &self.loops[func]
    }

    /// Is `block` part of any loop in `func`?
    pub fn is_in_loop(&self, func: FuncId, block: u32) -> bool {
        self.loops[func].iter().any(|l| l.contains(block))
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }
}

/// Natural loops of one function: one per back edge `tail → header`,
/// where the header is on the DFS stack when the tail reaches it.
fn find_loops(func: &Function) -> Vec<Loop> {
    if func.blocks.is_empty() {
        return Vec::new();
    }

    let n = func.blocks.len();
    let mut back_edges = Vec::new();
    let mut visited = FixedBitSet::with_capacity(n);
    let mut on_stack = FixedBitSet::with_capacity(n);
    dfs_back_edges(func, 0, &mut visited, &mut on_stack, &mut back_edges);

    back_edges
        .into_iter()
        .map(|(tail, header)| natural_loop(func, tail, header))
        .collect()
}

fn dfs_back_edges(
    func: &Function,
    block: u32,
    visited: &mut FixedBitSet,
    on_stack: &mut FixedBitSet,
    back_edges: &mut Vec<(u32, u32)>,
) {
    visited.insert(block as usize);
    on_stack.insert(block as usize);
    for &succ in &func.blocks[block as usize].succs {
        if on_stack.contains(succ as usize) {
            back_edges.push((block, succ));
        } else if !visited.contains(succ as usize) {
            dfs_back_edges(func, succ, visited, on_stack, back_edges);
        }
    }
    on_stack.set(block as usize, false);
}

/// Blocks of the natural loop of back edge `tail → header`: the header
/// plus every block that reaches the tail without passing through the
/// header.
fn natural_loop(func: &Function, tail: u32, header: u32) -> Loop {
    let mut in_loop = FixedBitSet::with_capacity(func.blocks.len());
    in_loop.insert(header as usize);
    let mut work = vec![tail];
    while let Some(block) = work.pop() {
        if in_loop.contains(block as usize) {
            continue;
        }
        in_loop.insert(block as usize);
        for &pred in &func.blocks[block as usize].preds {
            work.push(pred);
        }
    }
    Loop {
        blocks: in_loop.ones().map(|b| b as u32).collect(),
    }
}
