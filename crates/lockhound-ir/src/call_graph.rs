//! Function call graph built from SSA call sites.
//!
//! Edges record the instruction that makes the call, so a path can be
//! walked back to concrete call sites. Goroutine launches are edges too,
//! but the double-lock path search skips them: a `go` transfers the
//! callee to another goroutine, which cannot re-acquire a lock held by
//! this one on the same control path.

use fixedbitset::FixedBitSet;

use crate::calls::unwrap_function;
use crate::ir::{FuncId, InstrKind, InstrRef, SsaProgram};

/// One call edge: `caller` invokes `callee` at `site`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub caller: FuncId,
    pub callee: FuncId,
    pub site: InstrRef,
    /// True when the call is a goroutine launch.
    pub is_go: bool,
}

/// Indexed call graph over the function arena.
pub struct CallGraph {
    edges_from: Vec<Vec<CallEdge>>,
}

impl CallGraph {
    pub fn build(ssa: &SsaProgram) -> Self {
        let mut edges_from: Vec<Vec<CallEdge>> = vec![Vec::new(); ssa.functions.len()];

        for (caller, func) in ssa.functions.iter().enumerate() {
            for block in &func.blocks {
                for (index, ins) in block.instrs.iter().enumerate() {
                    let (call, is_go) = match &ins.kind {
                        InstrKind::Call(c) => (c, false),
                        InstrKind::Defer(c) => (c, false),
                        InstrKind::Go(c) => (c, true),
                        _ => continue,
                    };
                    let Some(callee) = unwrap_function(&call.callee) else {
                        continue;
                    };
                    edges_from[caller].push(CallEdge {
                        caller,
                        callee,
                        site: InstrRef {
                            func: caller,
                            block: block.index,
                            index: index as u32,
                        },
                        is_go,
                    });
                }
            }
        }

        Self { edges_from }
    }

    /// Outgoing edges of `func`.
    pub fn calls_from(&self, func: FuncId) -> &[CallEdge] {
        &self.edges_from[func]
    }

    pub fn edge_count(&self) -> usize {
        self.edges_from.iter().map(|v| v.len()).sum()
    }

    /// Find a path from `src` to any function matching `target`,
    /// skipping goroutine-launch edges.
    ///
    /// Returns the edges along the path. A `src` that itself matches
    /// yields `Some` with an *empty* path; callers that need an actual
    /// call chain must check for emptiness, not just presence.
    pub fn path_search_ignoring_go(
        &self,
        src: FuncId,
        target: &dyn Fn(FuncId) -> bool,
    ) -> Option<Vec<CallEdge>> {
        let mut visited = FixedBitSet::with_capacity(self.edges_from.len());
        let mut stack = Vec::new();
        if self.search(src, target, &mut visited, &mut stack) {
            Some(stack)
        } else {
            None
        }
    }

    fn search(
        &self,
        current: FuncId,
        target: &dyn Fn(FuncId) -> bool,
        visited: &mut FixedBitSet,
        stack: &mut Vec<CallEdge>,
    ) -> bool {
        if target(current) {
            return true;
        }
        if visited.contains(current) {
            return false;
        }
        visited.insert(current);
        for &edge in &self.edges_from[current] {
            if edge.is_go {
                continue;
            }
            stack.push(edge);
            if self.search(edge.callee, target, visited, stack) {
                return true;
            }
            stack.pop();
        }
        false
    }
}
