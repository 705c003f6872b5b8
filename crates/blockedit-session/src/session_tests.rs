//! Unit tests for edit sessions.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use blockedit_lighting::LightError;
use blockedit_sync::{
    ChannelSink, ChunkSnapshotPacket, CodecError, SendError, Viewer, ViewerId,
};
use blockedit_voxel::{ChunkPos, StoreError, WorldBounds};
use crossbeam_channel::Receiver;

use super::*;

// ---------------------------------------------------------------------------
// Fake collaborators
// ---------------------------------------------------------------------------

/// Store with world height `0..256` that records every call.
#[derive(Default)]
struct FakeStore {
    blocks: HashMap<BlockPos, BlockState>,
    loaded: BTreeSet<ChunkPos>,
    resolved: Vec<BlockPos>,
    applied: Vec<(ChunkPos, BlockPos, BlockState)>,
}

impl FakeStore {
    fn with_block(mut self, pos: BlockPos, state: BlockState) -> Self {
        self.blocks.insert(pos, state);
        self.loaded.insert(pos.chunk_pos());
        self
    }
}

impl ChunkStore for FakeStore {
    fn resolve_chunk(&mut self, pos: BlockPos) -> Result<ChunkPos, StoreError> {
        self.resolved.push(pos);
        if !(0..256).contains(&pos.y) {
            return Err(StoreError::OutOfBounds {
                y: pos.y,
                min_y: 0,
                max_y: 256,
            });
        }
        self.loaded.insert(pos.chunk_pos());
        Ok(pos.chunk_pos())
    }

    fn apply_block(&mut self, chunk: ChunkPos, pos: BlockPos, state: BlockState) {
        self.applied.push((chunk, pos, state));
        self.blocks.insert(pos, state);
    }

    fn block_at(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or(BlockState::AIR)
    }
}

/// Light engine recording each call along with how many raw writes the
/// store had seen at that moment.
#[derive(Default)]
struct FakeLight {
    calls: Vec<(BlockPos, usize)>,
    fail_at: HashSet<BlockPos>,
}

impl LightEngine<FakeStore> for FakeLight {
    fn recompute_at(&mut self, store: &mut FakeStore, pos: BlockPos) -> Result<(), LightError> {
        self.calls.push((pos, store.applied.len()));
        if self.fail_at.contains(&pos) {
            return Err(LightError::NotLoaded { pos });
        }
        Ok(())
    }
}

#[derive(Default)]
struct FakeCodec {
    built: Vec<ChunkPos>,
    sent: Vec<(ViewerId, ChunkPos)>,
    fail_build: HashSet<ChunkPos>,
    disconnected: HashSet<ViewerId>,
}

impl ChunkSnapshotCodec<FakeStore> for FakeCodec {
    fn build_snapshot(
        &mut self,
        _store: &FakeStore,
        chunk: ChunkPos,
    ) -> Result<ChunkSnapshotPacket, CodecError> {
        if self.fail_build.contains(&chunk) {
            return Err(CodecError::Encode("forced".into()));
        }
        self.built.push(chunk);
        Ok(ChunkSnapshotPacket::new(chunk, 0, Arc::from(Vec::new()), 0))
    }

    fn send(&mut self, viewer: &Viewer, packet: &ChunkSnapshotPacket) -> Result<(), SendError> {
        if self.disconnected.contains(&viewer.id) {
            return Err(SendError::Disconnected(viewer.id));
        }
        self.sent.push((viewer.id, packet.chunk()));
        Ok(())
    }
}

type TestSession = EditSession<FakeStore, FakeLight, ViewerList, FakeCodec>;

fn viewer(id: u64, x: i32, z: i32, radius: u32) -> Viewer {
    Viewer::new(ViewerId(id), ChunkPos::new(x, z), radius)
}

fn session_with(store: FakeStore, viewers: Vec<Viewer>) -> TestSession {
    EditSession::new(
        store,
        FakeLight::default(),
        viewers.into_iter().collect(),
        FakeCodec::default(),
    )
}

fn session(viewers: Vec<Viewer>) -> TestSession {
    session_with(FakeStore::default(), viewers)
}

fn sorted_sent(session: &TestSession) -> Vec<(ViewerId, ChunkPos)> {
    let mut sent = session.codec().sent.clone();
    sent.sort();
    sent
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

#[test]
fn test_read_your_writes() {
    let pos = BlockPos::new(5, 5, 5);
    let store = FakeStore::default().with_block(pos, BlockState::DIRT);
    let mut session = session_with(store, vec![]);

    assert_eq!(session.get_block(pos), BlockState::DIRT);
    session.set_block(pos, BlockState::STONE);
    assert_eq!(session.get_block(pos), BlockState::STONE);
    session.set_block(pos, BlockState::GLASS);
    assert_eq!(session.get_block(pos), BlockState::GLASS);

    // Reads never reach resolution or raw writes.
    assert!(session.store().resolved.is_empty());
    assert!(session.store().applied.is_empty());
    assert_eq!(session.store().block_at(pos), BlockState::DIRT);
}

#[test]
fn test_set_blocks_stages_in_order() {
    let mut session = session(vec![]);
    let pos = BlockPos::new(0, 10, 0);
    session.set_blocks([
        (pos, BlockState::STONE),
        (BlockPos::new(1, 10, 0), BlockState::DIRT),
        (pos, BlockState::GRASS),
    ]);

    assert_eq!(session.staged_len(), 2);
    assert_eq!(session.get_block(pos), BlockState::GRASS);
    let staged: HashMap<_, _> = session.staged().collect();
    assert_eq!(staged[&BlockPos::new(1, 10, 0)], BlockState::DIRT);
}

#[test]
fn test_discard_drops_without_applying() {
    let mut session = session(vec![viewer(1, 0, 0, 4)]);
    session.set_block(BlockPos::new(0, 10, 0), BlockState::STONE);
    session.set_block(BlockPos::new(0, 11, 0), BlockState::STONE);

    assert_eq!(session.discard(), 2);
    assert!(session.is_empty());
    let report = session.commit(true).unwrap();
    assert_eq!(report, CommitReport::default());
    assert!(session.store().applied.is_empty());
}

// ---------------------------------------------------------------------------
// Commit laws
// ---------------------------------------------------------------------------

#[test]
fn test_overwrite_law() {
    let pos = BlockPos::new(3, 40, -7);

    let mut twice = session(vec![]);
    twice.set_block(pos, BlockState::STONE);
    twice.set_block(pos, BlockState::DIRT);
    twice.commit(true).unwrap();

    let mut once = session(vec![]);
    once.set_block(pos, BlockState::DIRT);
    once.commit(true).unwrap();

    assert_eq!(twice.store().blocks, once.store().blocks);
    assert_eq!(twice.store().applied, once.store().applied);
    assert_eq!(twice.store().applied.len(), 1);
}

#[test]
fn test_commit_drains_and_second_commit_is_noop() {
    let mut session = session(vec![viewer(1, 0, 0, 2)]);
    session.set_block(BlockPos::new(1, 1, 1), BlockState::STONE);
    session.set_block(BlockPos::new(40, 1, 1), BlockState::STONE);

    let first = session.commit(true).unwrap();
    assert!(session.is_empty());
    assert_eq!(first.packets_sent, 2);

    let second = session.commit(true).unwrap();
    assert_eq!(second, CommitReport::default());
    assert!(second.touched_chunks.is_empty());
    assert_eq!(second.packets_sent, 0);
    assert_eq!(session.codec().sent.len(), 2);
    assert_eq!(session.codec().built.len(), 2);
}

#[test]
fn test_edits_in_one_chunk_build_one_packet() {
    let mut session = session(vec![viewer(1, 0, 0, 2), viewer(2, 1, 1, 0)]);
    for i in 0..10 {
        session.set_block(BlockPos::new(i, 64 + i, 15 - i), BlockState::STONE);
    }

    let report = session.commit(false).unwrap();
    assert_eq!(report.staged, 10);
    assert_eq!(report.touched_chunks, vec![ChunkPos::new(0, 0)]);
    assert_eq!(report.snapshots_built, 1);
    assert_eq!(session.codec().built, vec![ChunkPos::new(0, 0)]);
    // One send per viewer, not per edit.
    assert_eq!(report.packets_sent, 2);
}

#[test]
fn test_visibility_boundary() {
    let mut session = session(vec![viewer(1, 0, 0, 2)]);
    session.set_block(BlockPos::new(48, 10, 0), BlockState::STONE);
    session.set_block(BlockPos::new(64, 10, 0), BlockState::STONE);

    let report = session.commit(false).unwrap();
    assert_eq!(
        report.touched_chunks,
        vec![ChunkPos::new(3, 0), ChunkPos::new(4, 0)]
    );
    assert_eq!(report.snapshots_built, 2);
    assert_eq!(session.codec().sent, vec![(ViewerId(1), ChunkPos::new(3, 0))]);
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn stone_and_air_session() -> TestSession {
    let store = FakeStore::default().with_block(BlockPos::new(0, 0, 1), BlockState::DIRT);
    let mut session = session_with(
        store,
        vec![
            viewer(1, 0, 0, 2),
            viewer(2, 10, 10, 2),
            viewer(3, 1, -1, 0),
        ],
    );
    session.set_block(BlockPos::new(0, 0, 0), BlockState::STONE);
    session.set_block(BlockPos::new(0, 0, 1), BlockState::AIR);
    session
}

#[test]
fn test_stone_and_air_with_lighting() {
    let mut session = stone_and_air_session();
    let report = session.commit(true).unwrap();

    let store = session.store();
    assert_eq!(store.block_at(BlockPos::new(0, 0, 0)), BlockState::STONE);
    assert_eq!(store.block_at(BlockPos::new(0, 0, 1)), BlockState::AIR);

    let mut lit: Vec<_> = session.light_engine().calls.iter().map(|(p, _)| *p).collect();
    lit.sort();
    assert_eq!(lit, vec![BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 1)]);
    // Lighting only starts once every edit is in the store.
    assert!(session.light_engine().calls.iter().all(|&(_, applied)| applied == 2));

    assert_eq!(session.codec().built, vec![ChunkPos::new(0, 0)]);
    assert_eq!(
        sorted_sent(&session),
        vec![
            (ViewerId(1), ChunkPos::new(0, 0)),
            (ViewerId(3), ChunkPos::new(0, 0)),
        ]
    );
    assert!(session.is_empty());
    assert_eq!(report.light_updates, 2);
    assert_eq!(report.packets_sent, 2);
    assert!(report.is_clean());
}

#[test]
fn test_stone_and_air_without_lighting() {
    let mut session = stone_and_air_session();
    let report = session.commit(false).unwrap();

    assert!(session.light_engine().calls.is_empty());
    assert_eq!(report.light_updates, 0);

    assert_eq!(session.store().block_at(BlockPos::new(0, 0, 0)), BlockState::STONE);
    assert_eq!(session.store().block_at(BlockPos::new(0, 0, 1)), BlockState::AIR);
    assert_eq!(session.codec().built, vec![ChunkPos::new(0, 0)]);
    assert_eq!(report.packets_sent, 2);
    assert!(session.is_empty());
}

#[test]
fn test_edit_in_unloaded_chunk_is_resolved_and_sent() {
    let far = BlockPos::new(100, 10, -100);
    let mut session = session(vec![viewer(1, 6, -7, 1)]);
    assert!(session.store().loaded.is_empty());

    session.set_block(far, BlockState::GLASS);
    let report = session.commit(true).unwrap();

    assert!(session.store().loaded.contains(&ChunkPos::new(6, -7)));
    assert_eq!(session.store().block_at(far), BlockState::GLASS);
    assert_eq!(report.touched_chunks, vec![ChunkPos::new(6, -7)]);
    assert_eq!(session.codec().sent, vec![(ViewerId(1), ChunkPos::new(6, -7))]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_resolution_failure_aborts_and_keeps_buffer() {
    let bad = BlockPos::new(0, 1000, 0);
    let mut session = session(vec![viewer(1, 0, 0, 4)]);
    session.set_block(BlockPos::new(0, 10, 0), BlockState::STONE);
    session.set_block(bad, BlockState::STONE);

    let err = session.commit(true).unwrap_err();
    match err {
        CommitError::Resolve { pos, source } => {
            assert_eq!(pos, bad);
            assert!(matches!(source, StoreError::OutOfBounds { y: 1000, .. }));
        }
    }

    assert_eq!(session.staged_len(), 2);
    assert!(session.light_engine().calls.is_empty());
    assert!(session.codec().built.is_empty());
    assert!(session.codec().sent.is_empty());

    // Dropping the bad edit lets the rest go through.
    session.discard();
    session.set_block(BlockPos::new(0, 10, 0), BlockState::STONE);
    assert!(session.commit(true).unwrap().is_clean());
}

#[test]
fn test_light_failure_is_reported_and_commit_continues() {
    let broken = BlockPos::new(2, 10, 2);
    let mut session = session(vec![viewer(1, 0, 0, 1)]);
    session.light.fail_at.insert(broken);
    session.set_block(broken, BlockState::GLOWSTONE);
    session.set_block(BlockPos::new(3, 10, 2), BlockState::STONE);

    let report = session.commit(true).unwrap();
    assert_eq!(report.light_updates, 1);
    assert_eq!(
        report.failures,
        vec![CommitFailure::Light {
            pos: broken,
            source: LightError::NotLoaded { pos: broken },
        }]
    );
    assert_eq!(report.packets_sent, 1);
    assert!(session.is_empty());
}

#[test]
fn test_snapshot_failure_skips_only_that_chunk() {
    let mut session = session(vec![viewer(1, 0, 0, 4)]);
    session.codec.fail_build.insert(ChunkPos::new(1, 0));
    session.set_block(BlockPos::new(0, 10, 0), BlockState::STONE);
    session.set_block(BlockPos::new(16, 10, 0), BlockState::STONE);

    let report = session.commit(false).unwrap();
    assert_eq!(report.touched_chunks.len(), 2);
    assert_eq!(report.snapshots_built, 1);
    assert!(matches!(
        report.failures.as_slice(),
        [CommitFailure::Snapshot { chunk, .. }] if *chunk == ChunkPos::new(1, 0)
    ));
    assert_eq!(session.codec().sent, vec![(ViewerId(1), ChunkPos::new(0, 0))]);
}

#[test]
fn test_disconnected_viewer_does_not_block_others() {
    let mut session = session(vec![viewer(1, 0, 0, 2), viewer(2, 0, 0, 2)]);
    session.codec.disconnected.insert(ViewerId(1));
    session.set_block(BlockPos::new(0, 10, 0), BlockState::STONE);

    let report = session.commit(false).unwrap();
    assert_eq!(report.packets_sent, 1);
    assert_eq!(
        report.failures,
        vec![CommitFailure::Send {
            viewer: ViewerId(1),
            chunk: ChunkPos::new(0, 0),
            source: SendError::Disconnected(ViewerId(1)),
        }]
    );
    assert_eq!(session.codec().sent, vec![(ViewerId(2), ChunkPos::new(0, 0))]);
}

#[test]
fn test_viewers_are_snapshotted_per_commit() {
    let mut session = session(vec![viewer(1, 0, 0, 2)]);
    session.set_block(BlockPos::new(0, 10, 0), BlockState::STONE);
    session.commit(false).unwrap();

    session.viewers_mut().add(viewer(2, 0, 0, 2));
    session.viewers_mut().move_to(ViewerId(1), ChunkPos::new(50, 50));
    session.set_block(BlockPos::new(0, 11, 0), BlockState::STONE);
    session.commit(false).unwrap();

    assert_eq!(
        session.codec().sent,
        vec![
            (ViewerId(1), ChunkPos::new(0, 0)),
            (ViewerId(2), ChunkPos::new(0, 0)),
        ]
    );
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

fn world_session() -> (WorldSession, Receiver<ChunkSnapshotPacket>) {
    let world = VoxelWorld::flat(WorldBounds::new(0, 32).unwrap(), 8);
    let mut codec = SnapshotCodec::new(ChannelSink::new());
    let rx = codec.sink_mut().connect(ViewerId(1));
    let viewers: ViewerList = [viewer(1, 0, 0, 2)].into_iter().collect();
    (
        EditSession::new(world, FloodLightEngine::new(), viewers, codec),
        rx,
    )
}

#[test]
fn test_world_session_broadcasts_lit_snapshot() {
    let (mut session, rx) = world_session();
    let lamp = BlockPos::new(8, 8, 8);
    session.set_block(lamp, BlockState::GLOWSTONE);
    session.set_block(BlockPos::new(9, 8, 8), BlockState::GLASS);

    let report = session.commit(true).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.touched_chunks, vec![ChunkPos::new(0, 0)]);
    assert_eq!(report.light_updates, 2);
    assert_eq!(report.packets_sent, 1);

    let packet = rx.try_recv().unwrap();
    assert!(rx.try_recv().is_err());
    let snapshot = packet.decode().unwrap();
    assert_eq!(snapshot.block(lamp), Some(BlockState::GLOWSTONE));
    assert_eq!(snapshot.block(BlockPos::new(9, 8, 8)), Some(BlockState::GLASS));
    assert_eq!(snapshot.light(lamp).unwrap().block(), 15);
    assert_eq!(snapshot.light(BlockPos::new(9, 8, 8)).unwrap().block(), 14);
    assert_eq!(snapshot.light(BlockPos::new(10, 8, 8)).unwrap().block(), 13);
    assert_eq!(snapshot.light(BlockPos::new(8, 9, 8)).unwrap().block(), 14);
}

#[test]
fn test_world_session_reads_do_not_load() {
    let (session, _rx) = world_session();
    assert_eq!(session.get_block(BlockPos::new(500, 2, 500)), BlockState::STONE);
    assert_eq!(session.get_block(BlockPos::new(500, 20, 500)), BlockState::AIR);
    assert_eq!(session.store().loaded_count(), 0);
}
