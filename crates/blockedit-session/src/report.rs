//! Commit outcomes.

use blockedit_lighting::LightError;
use blockedit_sync::{CodecError, SendError, ViewerId};
use blockedit_voxel::{BlockPos, ChunkPos, StoreError};
use thiserror::Error;

/// Error that aborts a commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// The store could not resolve the chunk for a staged position. Edits
    /// applied before this one stay applied; the staging buffer is kept.
    #[error("failed to resolve chunk for {pos}")]
    Resolve {
        pos: BlockPos,
        #[source]
        source: StoreError,
    },
}

/// A best-effort step that failed without aborting the commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitFailure {
    #[error("lighting update at {pos} failed")]
    Light {
        pos: BlockPos,
        #[source]
        source: LightError,
    },
    /// The chunk was skipped for every viewer.
    #[error("snapshot of chunk {chunk} failed")]
    Snapshot {
        chunk: ChunkPos,
        #[source]
        source: CodecError,
    },
    #[error("sending chunk {chunk} to {viewer} failed")]
    Send {
        viewer: ViewerId,
        chunk: ChunkPos,
        #[source]
        source: SendError,
    },
}

/// What one commit did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Distinct positions that were staged.
    pub staged: usize,
    /// Chunks that received at least one edit, in ascending order.
    pub touched_chunks: Vec<ChunkPos>,
    /// Successful light recomputes.
    pub light_updates: usize,
    /// Packets built, at most one per touched chunk.
    pub snapshots_built: usize,
    /// Packets handed to viewers.
    pub packets_sent: usize,
    /// Best-effort failures in the order they occurred.
    pub failures: Vec<CommitFailure>,
}

impl CommitReport {
    /// Returns `true` if no best-effort step failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
