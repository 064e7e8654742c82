//! Per-function basic-block graph with pruned path search.
//!
//! Nodes are the root function's basic blocks, created lazily; edges are
//! the CFG successor edges. The lock-path search answers "is there a
//! path from `src` to `dst` whose intermediate blocks all satisfy a
//! caller-supplied predicate"; the double-lock checker supplies "does
//! not release the lock before re-acquiring it".

use fixedbitset::FixedBitSet;

use crate::ir::{BasicBlock, Function};

/// Node handle: the block's index within the function.
pub type BbNodeId = u32;

pub struct BbCallGraph<'a> {
    func: &'a Function,
    created: FixedBitSet,
}

impl<'a> BbCallGraph<'a> {
    pub fn new(func: &'a Function) -> Self {
        Self {
            func,
            created: FixedBitSet::with_capacity(func.blocks.len()),
        }
    }

    /// Materialize the node for `block`. Idempotent: creating the same
    /// node twice returns the same handle.
    pub fn create_bb_node(&mut self, block: u32) -> BbNodeId {
        self.created.insert(block as usize);
        block
    }

    pub fn node_count(&self) -> usize {
        self.created.count_ones(..)
    }

    fn block(&self, id: BbNodeId) -> &'a BasicBlock {
        &self.func.blocks[id as usize]
    }

    /// Find a path from `src` to `dst` where every intermediate block
    /// satisfies `prune`. `src` and `dst` themselves are not tested;
    /// callers vet the endpoints separately. When `src == dst` the path
    /// must be a genuine cycle through at least one edge.
    ///
    /// Returns the block sequence including both endpoints, or an empty
    /// vector when no such path exists.
    pub fn lock_path_search(
        &self,
        src: BbNodeId,
        dst: BbNodeId,
        prune: &dyn Fn(&BasicBlock) -> bool,
    ) -> Vec<BbNodeId> {
        let mut visited = FixedBitSet::with_capacity(self.func.blocks.len());
        let mut path = vec![src];
        if self.search(src, dst, prune, &mut visited, &mut path) {
            path
        } else {
            Vec::new()
        }
    }

    fn search(
        &self,
        current: BbNodeId,
        dst: BbNodeId,
        prune: &dyn Fn(&BasicBlock) -> bool,
        visited: &mut FixedBitSet,
        path: &mut Vec<BbNodeId>,
    ) -> bool {
        for &succ in &self.block(current).succs {
            if succ == dst {
                path.push(succ);
                return true;
            }
            if visited.contains(succ as usize) {
                continue;
            }
            if !prune(self.block(succ)) {
                continue;
            }
            visited.insert(succ as usize);
            path.push(succ);
            if self.search(succ, dst, prune, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }
}
