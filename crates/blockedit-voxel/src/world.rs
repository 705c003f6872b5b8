//! In-memory world: the reference [`ChunkStore`].
//!
//! Columns live in an [`FxHashMap`](rustc_hash::FxHashMap) keyed by
//! [`ChunkPos`]. Resolving a position in a column that is not resident
//! generates the column on the spot, which is the slow-but-correct path edit
//! sessions rely on for edits in unloaded regions.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::column::ChunkColumn;
use crate::coords::{BlockPos, CHUNK_WIDTH, ChunkPos};
use crate::light::PackedLight;
use crate::registry::{BlockRegistry, BlockState};
use crate::store::{ChunkStore, StoreError, WorldBounds};

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Produces the initial contents of columns that are faulted in.
///
/// `block_at` must be deterministic: it also answers reads of columns that
/// were never loaded.
pub trait ColumnGenerator {
    /// The generated state at `pos`.
    fn block_at(&self, pos: BlockPos) -> BlockState;

    /// Builds a whole column. The default fills it block by block from
    /// [`block_at`](ColumnGenerator::block_at).
    fn generate(&self, pos: ChunkPos, bounds: WorldBounds) -> ChunkColumn {
        let mut column = ChunkColumn::new(pos, bounds);
        let base_x = pos.min_block_x() as i32;
        let base_z = pos.min_block_z() as i32;
        for y in bounds.min_y()..bounds.max_y() {
            for dz in 0..CHUNK_WIDTH {
                for dx in 0..CHUNK_WIDTH {
                    let block = BlockPos::new(base_x + dx, y, base_z + dz);
                    let state = self.block_at(block);
                    if !state.is_air() {
                        column.set_block(block, state);
                    }
                }
            }
        }
        column
    }
}

/// Horizontal layers stacked upward from a base height, air above.
#[derive(Clone, Debug)]
pub struct FlatGenerator {
    base_y: i32,
    layers: Vec<(BlockState, u32)>,
}

impl FlatGenerator {
    /// Starts an empty stack at `base_y`.
    pub fn new(base_y: i32) -> Self {
        Self {
            base_y,
            layers: Vec::new(),
        }
    }

    /// Adds a layer of `thickness` blocks on top of the existing ones.
    pub fn with_layer(mut self, state: BlockState, thickness: u32) -> Self {
        self.layers.push((state, thickness));
        self
    }

    /// Stone up to four blocks below `ground_level`, then three dirt and one
    /// grass, so the highest solid block sits at `ground_level - 1`.
    pub fn standard(bounds: WorldBounds, ground_level: i32) -> Self {
        let stone = (i64::from(ground_level) - 4 - i64::from(bounds.min_y())).max(0) as u32;
        Self::new(bounds.min_y())
            .with_layer(BlockState::STONE, stone)
            .with_layer(BlockState::DIRT, 3)
            .with_layer(BlockState::GRASS, 1)
    }

    /// Y of the first air block above the stack.
    pub fn surface_y(&self) -> i64 {
        i64::from(self.base_y) + self.layers.iter().map(|(_, t)| i64::from(*t)).sum::<i64>()
    }
}

impl ColumnGenerator for FlatGenerator {
    fn block_at(&self, pos: BlockPos) -> BlockState {
        let mut top = i64::from(self.base_y);
        if i64::from(pos.y) < top {
            return BlockState::AIR;
        }
        for &(state, thickness) in &self.layers {
            top += i64::from(thickness);
            if i64::from(pos.y) < top {
                return state;
            }
        }
        BlockState::AIR
    }
}

// ---------------------------------------------------------------------------
// VoxelWorld
// ---------------------------------------------------------------------------

/// Owns every resident column of one world.
pub struct VoxelWorld {
    bounds: WorldBounds,
    registry: Arc<BlockRegistry>,
    generator: Box<dyn ColumnGenerator>,
    columns: FxHashMap<ChunkPos, ChunkColumn>,
    faulted: u64,
}

impl VoxelWorld {
    /// Creates an empty world; every column is faulted in from `generator`.
    pub fn new(
        bounds: WorldBounds,
        registry: Arc<BlockRegistry>,
        generator: Box<dyn ColumnGenerator>,
    ) -> Self {
        Self {
            bounds,
            registry,
            generator,
            columns: FxHashMap::default(),
            faulted: 0,
        }
    }

    /// A world using [`FlatGenerator::standard`] and the default registry.
    pub fn flat(bounds: WorldBounds, ground_level: i32) -> Self {
        Self::new(
            bounds,
            Arc::new(BlockRegistry::with_defaults()),
            Box::new(FlatGenerator::standard(bounds, ground_level)),
        )
    }

    /// Vertical extent.
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Block definitions shared with the light engine.
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    /// Returns `true` if the column is resident.
    pub fn is_loaded(&self, pos: ChunkPos) -> bool {
        self.columns.contains_key(&pos)
    }

    /// Number of resident columns.
    pub fn loaded_count(&self) -> usize {
        self.columns.len()
    }

    /// How many columns were generated on demand since creation.
    pub fn faulted_count(&self) -> u64 {
        self.faulted
    }

    /// A resident column.
    pub fn column(&self, pos: ChunkPos) -> Option<&ChunkColumn> {
        self.columns.get(&pos)
    }

    /// Makes the column resident, generating and sky-seeding it if needed.
    pub fn load_column(&mut self, pos: ChunkPos) -> &mut ChunkColumn {
        self.columns.entry(pos).or_insert_with(|| {
            let mut column = self.generator.generate(pos, self.bounds);
            column.seed_skylight(&self.registry);
            self.faulted += 1;
            tracing::debug!(chunk = %pos, "faulted in column");
            column
        })
    }

    /// Drops a resident column and returns it. Edits in it are lost; the
    /// next resolve regenerates it.
    pub fn unload_column(&mut self, pos: ChunkPos) -> Option<ChunkColumn> {
        let column = self.columns.remove(&pos)?;
        tracing::debug!(chunk = %pos, version = column.version(), "unloaded column");
        Some(column)
    }

    /// Light at `pos`, or `None` if its column is not resident or `pos` is
    /// outside the world's height.
    pub fn light_at(&self, pos: BlockPos) -> Option<PackedLight> {
        self.columns.get(&pos.chunk_pos())?.light(pos)
    }

    /// Writes light at `pos`. Returns `false` if nothing was written.
    pub fn set_light(&mut self, pos: BlockPos, light: PackedLight) -> bool {
        match self.columns.get_mut(&pos.chunk_pos()) {
            Some(column) => column.set_light(pos, light),
            None => false,
        }
    }
}

impl ChunkStore for VoxelWorld {
    fn resolve_chunk(&mut self, pos: BlockPos) -> Result<ChunkPos, StoreError> {
        self.bounds.check(pos)?;
        let chunk = pos.chunk_pos();
        self.load_column(chunk);
        Ok(chunk)
    }

    fn apply_block(&mut self, chunk: ChunkPos, pos: BlockPos, state: BlockState) {
        if !chunk.contains(pos) {
            tracing::warn!(chunk = %chunk, pos = %pos, "apply_block: position not in chunk");
            return;
        }
        match self.columns.get_mut(&chunk) {
            Some(column) => {
                if column.set_block(pos, state).is_none() {
                    tracing::warn!(pos = %pos, "apply_block: position outside world height");
                }
            }
            None => tracing::warn!(chunk = %chunk, "apply_block: chunk not resident"),
        }
    }

    fn block_at(&self, pos: BlockPos) -> BlockState {
        if !self.bounds.contains_y(pos.y) {
            return BlockState::AIR;
        }
        match self.columns.get(&pos.chunk_pos()) {
            Some(column) => column.block(pos),
            None => self.generator.block_at(pos),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> VoxelWorld {
        VoxelWorld::flat(WorldBounds::new(0, 32).unwrap(), 8)
    }

    #[test]
    fn test_standard_generator_layers() {
        let bounds = WorldBounds::new(0, 32).unwrap();
        let generator = FlatGenerator::standard(bounds, 8);
        assert_eq!(generator.surface_y(), 8);
        assert_eq!(generator.block_at(BlockPos::new(0, 0, 0)), BlockState::STONE);
        assert_eq!(generator.block_at(BlockPos::new(0, 3, 0)), BlockState::STONE);
        assert_eq!(generator.block_at(BlockPos::new(0, 4, 0)), BlockState::DIRT);
        assert_eq!(generator.block_at(BlockPos::new(0, 7, 0)), BlockState::GRASS);
        assert_eq!(generator.block_at(BlockPos::new(0, 8, 0)), BlockState::AIR);
        assert_eq!(generator.block_at(BlockPos::new(0, -1, 0)), BlockState::AIR);
    }

    #[test]
    fn test_resolve_faults_column_in() {
        let mut world = small_world();
        assert!(!world.is_loaded(ChunkPos::new(2, -1)));

        let chunk = world.resolve_chunk(BlockPos::new(40, 5, -3)).unwrap();
        assert_eq!(chunk, ChunkPos::new(2, -1));
        assert!(world.is_loaded(chunk));
        assert_eq!(world.faulted_count(), 1);

        // Second resolve reuses the resident column.
        world.resolve_chunk(BlockPos::new(41, 6, -4)).unwrap();
        assert_eq!(world.faulted_count(), 1);
        assert_eq!(world.loaded_count(), 1);
    }

    #[test]
    fn test_resolve_out_of_bounds_fails() {
        let mut world = small_world();
        let err = world.resolve_chunk(BlockPos::new(0, 32, 0)).unwrap_err();
        assert_eq!(
            err,
            StoreError::OutOfBounds {
                y: 32,
                min_y: 0,
                max_y: 32
            }
        );
        assert_eq!(world.loaded_count(), 0);
    }

    #[test]
    fn test_block_at_does_not_load() {
        let world = small_world();
        assert_eq!(world.block_at(BlockPos::new(100, 2, 100)), BlockState::STONE);
        assert_eq!(world.block_at(BlockPos::new(100, 20, 100)), BlockState::AIR);
        assert_eq!(world.block_at(BlockPos::new(100, -5, 100)), BlockState::AIR);
        assert_eq!(world.loaded_count(), 0);
    }

    #[test]
    fn test_apply_then_read_back() {
        let mut world = small_world();
        let pos = BlockPos::new(-3, 9, 17);
        let chunk = world.resolve_chunk(pos).unwrap();
        let before = world.column(chunk).unwrap().version();
        world.apply_block(chunk, pos, BlockState::GLASS);
        assert_eq!(world.block_at(pos), BlockState::GLASS);
        assert_eq!(world.column(chunk).unwrap().version(), before + 1);
    }

    #[test]
    fn test_apply_to_wrong_chunk_is_ignored() {
        let mut world = small_world();
        let pos = BlockPos::new(0, 9, 0);
        world.resolve_chunk(pos).unwrap();
        world.apply_block(ChunkPos::new(5, 5), pos, BlockState::STONE);
        assert_eq!(world.block_at(pos), BlockState::AIR);
    }

    #[test]
    fn test_unload_drops_edits() {
        let mut world = small_world();
        let pos = BlockPos::new(5, 20, 5);
        let chunk = world.resolve_chunk(pos).unwrap();
        world.apply_block(chunk, pos, BlockState::STONE);

        let column = world.unload_column(chunk).unwrap();
        assert_eq!(column.block(pos), BlockState::STONE);
        assert!(!world.is_loaded(chunk));
        assert_eq!(world.block_at(pos), BlockState::AIR);
        assert!(world.unload_column(chunk).is_none());

        world.resolve_chunk(pos).unwrap();
        assert_eq!(world.faulted_count(), 2);
        assert_eq!(world.block_at(pos), BlockState::AIR);
    }

    #[test]
    fn test_faulted_column_has_sky_light_above_ground() {
        let mut world = small_world();
        world.resolve_chunk(BlockPos::new(0, 0, 0)).unwrap();
        assert_eq!(world.light_at(BlockPos::new(0, 8, 0)).unwrap().sky(), 15);
        assert_eq!(world.light_at(BlockPos::new(0, 7, 0)).unwrap().sky(), 0);
        assert!(world.light_at(BlockPos::new(16, 8, 0)).is_none());
    }
}
