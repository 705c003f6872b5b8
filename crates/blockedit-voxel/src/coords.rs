//! Block and chunk coordinates.
//!
//! Chunks are full-height columns [`CHUNK_WIDTH`] blocks wide on X and Z.
//! Each column is split vertically into sections of [`SECTION_HEIGHT`] blocks,
//! the unit of palette storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of a chunk column along X and Z, in blocks.
pub const CHUNK_WIDTH: i32 = 16;

/// Height of one column section, in blocks.
pub const SECTION_HEIGHT: i32 = 16;

/// Number of blocks in one section (16 × 16 × 16).
pub const SECTION_VOLUME: usize = (CHUNK_WIDTH * CHUNK_WIDTH * SECTION_HEIGHT) as usize;

/// World-space position of a single block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// World X.
    pub x: i32,
    /// World Y (vertical).
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the column containing this block (floor division on X and Z).
    pub fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(self.x.div_euclid(CHUNK_WIDTH), self.z.div_euclid(CHUNK_WIDTH))
    }

    /// Returns the position offset by `(dx, dy, dz)`, saturating at the `i32` range.
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Locates this block inside a column whose lowest block is at `min_y` and
    /// which holds `section_count` sections.
    ///
    /// Returns `None` when `y` falls outside the column. X and Z are reduced
    /// modulo [`CHUNK_WIDTH`], so callers are responsible for checking the
    /// block actually belongs to the column.
    pub fn section_slot(self, min_y: i32, section_count: usize) -> Option<SectionSlot> {
        let rel_y = i64::from(self.y) - i64::from(min_y);
        if rel_y < 0 {
            return None;
        }
        let section = (rel_y / i64::from(SECTION_HEIGHT)) as usize;
        if section >= section_count {
            return None;
        }
        let lx = self.x.rem_euclid(CHUNK_WIDTH) as usize;
        let lz = self.z.rem_euclid(CHUNK_WIDTH) as usize;
        let ly = (rel_y % i64::from(SECTION_HEIGHT)) as usize;
        let width = CHUNK_WIDTH as usize;
        Some(SectionSlot {
            section,
            index: lx + lz * width + ly * width * width,
        })
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Index of a block inside a column: which section, and the linear index
/// within that section (x fastest, then z, then y).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionSlot {
    /// Section index counted from the bottom of the column.
    pub section: usize,
    /// Linear index in `0..SECTION_VOLUME`.
    pub index: usize,
}

/// Column coordinates on the horizontal chunk grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    /// Chunk-grid X.
    pub x: i32,
    /// Chunk-grid Z.
    pub z: i32,
}

impl ChunkPos {
    /// Creates a new chunk position.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// World X of the column's western edge.
    pub fn min_block_x(self) -> i64 {
        i64::from(self.x) * i64::from(CHUNK_WIDTH)
    }

    /// World Z of the column's northern edge.
    pub fn min_block_z(self) -> i64 {
        i64::from(self.z) * i64::from(CHUNK_WIDTH)
    }

    /// Returns `true` if `pos` lies inside this column (any height).
    pub fn contains(self, pos: BlockPos) -> bool {
        pos.chunk_pos() == self
    }

    /// Chebyshev (chessboard) distance between two columns.
    pub fn chebyshev_distance(self, other: ChunkPos) -> u64 {
        let dx = (i64::from(self.x) - i64::from(other.x)).unsigned_abs();
        let dz = (i64::from(self.z) - i64::from(other.z)).unsigned_abs();
        dx.max(dz)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}
