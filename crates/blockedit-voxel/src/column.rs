//! Full-height chunk columns.

use crate::coords::{BlockPos, CHUNK_WIDTH, ChunkPos, SECTION_HEIGHT};
use crate::light::{LightChannel, MAX_LIGHT, PackedLight};
use crate::registry::{BlockRegistry, BlockState, Opacity};
use crate::section::Section;
use crate::store::WorldBounds;

/// One chunk: a stack of sections covering the world's full height.
///
/// Reads outside the column's vertical range return air and no light;
/// writes there are ignored.
#[derive(Clone, Debug)]
pub struct ChunkColumn {
    pos: ChunkPos,
    min_y: i32,
    max_y: i32,
    sections: Vec<Section>,
    version: u64,
}

impl ChunkColumn {
    /// Creates an all-air, unlit column.
    pub fn new(pos: ChunkPos, bounds: WorldBounds) -> Self {
        let count = (bounds.height() / SECTION_HEIGHT as u32) as usize;
        Self {
            pos,
            min_y: bounds.min_y(),
            max_y: bounds.max_y(),
            sections: (0..count).map(|_| Section::filled(BlockState::AIR)).collect(),
            version: 0,
        }
    }

    /// Column coordinates.
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Lowest block Y held by the column.
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// One past the highest block Y held by the column.
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Sections from bottom to top.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Mutation counter, bumped on every block write that changes a state.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Block state at `pos`.
    pub fn block(&self, pos: BlockPos) -> BlockState {
        debug_assert!(self.pos.contains(pos));
        match pos.section_slot(self.min_y, self.sections.len()) {
            Some(slot) => self.sections[slot.section].block(slot.index),
            None => BlockState::AIR,
        }
    }

    /// Writes `state` at `pos`, returning the previous state, or `None` if
    /// `pos` is outside the column's height.
    pub fn set_block(&mut self, pos: BlockPos, state: BlockState) -> Option<BlockState> {
        debug_assert!(self.pos.contains(pos));
        let slot = pos.section_slot(self.min_y, self.sections.len())?;
        let previous = self.sections[slot.section].set_block(slot.index, state);
        if previous != state {
            self.version += 1;
        }
        Some(previous)
    }

    /// Light at `pos`, or `None` outside the column's height.
    pub fn light(&self, pos: BlockPos) -> Option<PackedLight> {
        let slot = pos.section_slot(self.min_y, self.sections.len())?;
        Some(self.sections[slot.section].light(slot.index))
    }

    /// Writes the light at `pos`. Returns `false` outside the column's height.
    pub fn set_light(&mut self, pos: BlockPos, light: PackedLight) -> bool {
        match pos.section_slot(self.min_y, self.sections.len()) {
            Some(slot) => {
                self.sections[slot.section].set_light(slot.index, light);
                true
            }
            None => false,
        }
    }

    /// Seeds sky light straight down each of the 256 block columns: full sky
    /// light until the first block that is not fully transparent, darkness
    /// below it. Sky light is not spread sideways here.
    pub fn seed_skylight(&mut self, registry: &BlockRegistry) {
        let base_x = self.pos.min_block_x() as i32;
        let base_z = self.pos.min_block_z() as i32;
        for dz in 0..CHUNK_WIDTH {
            for dx in 0..CHUNK_WIDTH {
                let mut level = MAX_LIGHT;
                for y in (self.min_y..self.max_y()).rev() {
                    let pos = BlockPos::new(base_x + dx, y, base_z + dz);
                    if registry.opacity(self.block(pos)) != Opacity::Transparent {
                        level = 0;
                    }
                    if let Some(light) = self.light(pos) {
                        self.set_light(pos, light.with_level(LightChannel::Sky, level));
                    }
                }
            }
        }
    }
}
