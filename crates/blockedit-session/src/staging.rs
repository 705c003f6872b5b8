//! Uncommitted edits.

use blockedit_voxel::{BlockPos, BlockState};
use rustc_hash::FxHashMap;

/// Pending block writes keyed by position. At most one state is held per
/// position; a later write replaces an earlier one.
///
/// Iteration order is unspecified.
#[derive(Clone, Debug, Default)]
pub struct StagingBuffer {
    entries: FxHashMap<BlockPos, BlockState>,
}

impl StagingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `state` at `pos`, returning the state it replaced, if any.
    pub fn insert(&mut self, pos: BlockPos, state: BlockState) -> Option<BlockState> {
        self.entries.insert(pos, state)
    }

    /// The staged state at `pos`.
    pub fn get(&self, pos: BlockPos) -> Option<BlockState> {
        self.entries.get(&pos).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, BlockState)> + '_ {
        self.entries.iter().map(|(&pos, &state)| (pos, state))
    }

    pub fn positions(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.entries.keys().copied()
    }
}

impl Extend<(BlockPos, BlockState)> for StagingBuffer {
    fn extend<I: IntoIterator<Item = (BlockPos, BlockState)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
