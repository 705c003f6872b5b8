//! Batched block edits with one synchronized commit.
//!
//! An [`EditSession`] stages block writes in memory and applies them in a
//! single pass on [`commit`](EditSession::commit): raw writes straight into
//! chunk storage, an optional light recompute per edited position, one full
//! snapshot per touched chunk, and a send of each snapshot to every viewer
//! close enough to see it.
//!
//! The raw writes skip whatever neighbour notification or physics the
//! store's normal update path performs. Callers that need those must not use
//! a session.
//!
//! A session has exactly one writer. Every mutating operation takes
//! `&mut self`, so sharing one between threads requires external locking.

use std::collections::BTreeSet;

use blockedit_lighting::{FloodLightEngine, LightEngine};
use blockedit_sync::{ChunkSnapshotCodec, SnapshotCodec, ViewerList, ViewerRegistry, is_visible};
use blockedit_voxel::{BlockPos, BlockState, ChunkStore, VoxelWorld};
use tracing::{debug, info, warn};

use crate::report::{CommitError, CommitFailure, CommitReport};
use crate::staging::StagingBuffer;

/// Session over the in-memory world with the reference collaborators.
pub type WorldSession = EditSession<VoxelWorld, FloodLightEngine, ViewerList, SnapshotCodec>;

/// Stages block edits and commits them as one batch.
pub struct EditSession<S, L, V, C> {
    store: S,
    light: L,
    viewers: V,
    codec: C,
    staging: StagingBuffer,
}

impl<S, L, V, C> EditSession<S, L, V, C>
where
    S: ChunkStore,
    L: LightEngine<S>,
    V: ViewerRegistry,
    C: ChunkSnapshotCodec<S>,
{
    /// Creates a session with an empty staging buffer.
    pub fn new(store: S, light: L, viewers: V, codec: C) -> Self {
        Self {
            store,
            light,
            viewers,
            codec,
            staging: StagingBuffer::new(),
        }
    }

    // -- Staging ------------------------------------------------------------

    /// Stages `state` at `pos`, replacing anything already staged there.
    ///
    /// Nothing is validated or resolved until commit, so positions in
    /// unloaded chunks are accepted.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) {
        self.staging.insert(pos, state);
    }

    /// Stages every `(pos, state)` pair in order.
    pub fn set_blocks<I>(&mut self, edits: I)
    where
        I: IntoIterator<Item = (BlockPos, BlockState)>,
    {
        self.staging.extend(edits);
    }

    /// The staged state at `pos`, or the store's current state if nothing is
    /// staged there. Never loads chunks.
    pub fn get_block(&self, pos: BlockPos) -> BlockState {
        self.staging
            .get(pos)
            .unwrap_or_else(|| self.store.block_at(pos))
    }

    /// Number of distinct staged positions.
    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// Staged edits, in unspecified order.
    pub fn staged(&self) -> impl Iterator<Item = (BlockPos, BlockState)> + '_ {
        self.staging.iter()
    }

    /// Drops every staged edit without applying it. Returns how many there
    /// were.
    pub fn discard(&mut self) -> usize {
        let dropped = self.staging.len();
        self.staging.clear();
        if dropped > 0 {
            debug!(dropped, "discarded staged edits");
        }
        dropped
    }

    // -- Commit -------------------------------------------------------------

    /// Applies every staged edit, optionally relights, and broadcasts one
    /// snapshot per touched chunk to the viewers that can see it.
    ///
    /// Lighting, snapshot and send failures are collected in the report and
    /// do not stop the commit. The staging buffer is empty afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CommitError::Resolve`] if the store cannot resolve a staged
    /// position. Edits applied before the failure are not rolled back,
    /// nothing is broadcast, and the staging buffer is left untouched.
    pub fn commit(&mut self, update_lighting: bool) -> Result<CommitReport, CommitError> {
        if self.staging.is_empty() {
            debug!("commit with nothing staged");
            return Ok(CommitReport::default());
        }

        let mut report = CommitReport {
            staged: self.staging.len(),
            ..CommitReport::default()
        };

        // Apply.
        let mut touched = BTreeSet::new();
        for (pos, state) in self.staging.iter() {
            let chunk = match self.store.resolve_chunk(pos) {
                Ok(chunk) => chunk,
                Err(source) => {
                    warn!(pos = %pos, error = %source, "commit aborted: chunk resolution failed");
                    return Err(CommitError::Resolve { pos, source });
                }
            };
            self.store.apply_block(chunk, pos, state);
            touched.insert(chunk);
        }
        debug!(edits = report.staged, chunks = touched.len(), "applied staged edits");

        // Relight once per edited position.
        if update_lighting {
            for pos in self.staging.positions() {
                match self.light.recompute_at(&mut self.store, pos) {
                    Ok(()) => report.light_updates += 1,
                    Err(source) => {
                        warn!(pos = %pos, error = %source, "lighting update failed");
                        report.failures.push(CommitFailure::Light { pos, source });
                    }
                }
            }
            debug!(updated = report.light_updates, "recomputed lighting");
        }

        // One packet per touched chunk.
        let mut packets = Vec::with_capacity(touched.len());
        for &chunk in &touched {
            match self.codec.build_snapshot(&self.store, chunk) {
                Ok(packet) => packets.push((chunk, packet)),
                Err(source) => {
                    warn!(chunk = %chunk, error = %source, "chunk snapshot failed");
                    report.failures.push(CommitFailure::Snapshot { chunk, source });
                }
            }
        }
        report.snapshots_built = packets.len();

        // Broadcast.
        let viewers = self.viewers.current_viewers();
        for viewer in &viewers {
            for (chunk, packet) in &packets {
                if !is_visible(viewer, *chunk) {
                    continue;
                }
                match self.codec.send(viewer, packet) {
                    Ok(()) => report.packets_sent += 1,
                    Err(source) => {
                        warn!(viewer = %viewer.id, chunk = %chunk, error = %source, "chunk send failed");
                        report.failures.push(CommitFailure::Send {
                            viewer: viewer.id,
                            chunk: *chunk,
                            source,
                        });
                    }
                }
            }
        }

        self.staging.clear();
        report.touched_chunks = touched.into_iter().collect();

        info!(
            edits = report.staged,
            chunks = report.touched_chunks.len(),
            viewers = viewers.len(),
            sent = report.packets_sent,
            failures = report.failures.len(),
            "committed edit session"
        );
        Ok(report)
    }

    // -- Collaborators ------------------------------------------------------

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access. Writes made here bypass staging and are not
    /// broadcast.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn light_engine(&self) -> &L {
        &self.light
    }

    pub fn viewers(&self) -> &V {
        &self.viewers
    }

    pub fn viewers_mut(&mut self) -> &mut V {
        &mut self.viewers
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn codec_mut(&mut self) -> &mut C {
        &mut self.codec
    }

    /// Splits the session back into its collaborators. Staged edits are lost.
    pub fn into_parts(self) -> (S, L, V, C) {
        (self.store, self.light, self.viewers, self.codec)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
