//! The chunk store contract consumed by edit sessions.

use thiserror::Error;

use crate::coords::{BlockPos, ChunkPos, SECTION_HEIGHT};
use crate::registry::BlockState;

/// Authoritative chunked block storage.
///
/// A [`ChunkPos`] returned by [`resolve_chunk`](ChunkStore::resolve_chunk)
/// is the handle later passed to [`apply_block`](ChunkStore::apply_block).
pub trait ChunkStore {
    /// Returns the chunk owning `pos`, faulting it into memory if needed.
    ///
    /// Must succeed for unloaded regions; loading synchronously is slower
    /// but allowed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `pos` cannot belong to any chunk, for
    /// example because it lies outside the world's vertical bounds.
    fn resolve_chunk(&mut self, pos: BlockPos) -> Result<ChunkPos, StoreError>;

    /// Writes `state` at `pos` inside the resolved `chunk`, with no neighbor
    /// notifications, physics or lighting side effects.
    fn apply_block(&mut self, chunk: ChunkPos, pos: BlockPos, state: BlockState);

    /// Current state at `pos` without loading anything.
    fn block_at(&self, pos: BlockPos) -> BlockState;
}

/// Errors produced by chunk stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The position is above or below the world.
    #[error("y = {y} is outside world bounds [{min_y}, {max_y})")]
    OutOfBounds {
        /// Requested Y.
        y: i32,
        /// Lowest valid Y.
        min_y: i32,
        /// One past the highest valid Y.
        max_y: i32,
    },
    /// The requested world height is unusable.
    #[error("invalid world bounds: min_y = {min_y}, height = {height}")]
    InvalidBounds {
        /// Requested lowest Y.
        min_y: i32,
        /// Requested height.
        height: u32,
    },
}

/// Vertical extent of a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldBounds {
    min_y: i32,
    max_y: i32,
    height: u32,
}

impl WorldBounds {
    /// Validates and creates bounds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidBounds`] unless `height` is a positive
    /// multiple of the section height, fits in `i32`, and the top stays
    /// within `i32`.
    pub fn new(min_y: i32, height: u32) -> Result<Self, StoreError> {
        let top = i64::from(min_y) + i64::from(height);
        if height == 0
            || height % SECTION_HEIGHT as u32 != 0
            || i32::try_from(height).is_err()
            || top > i64::from(i32::MAX)
        {
            return Err(StoreError::InvalidBounds { min_y, height });
        }
        Ok(Self {
            min_y,
            max_y: top as i32,
            height,
        })
    }

    /// Lowest valid Y.
    pub fn min_y(self) -> i32 {
        self.min_y
    }

    /// One past the highest valid Y.
    pub fn max_y(self) -> i32 {
        self.max_y
    }

    /// World height in blocks.
    pub fn height(self) -> u32 {
        self.height
    }

    /// Returns `true` if `y` is inside the world.
    pub fn contains_y(self, y: i32) -> bool {
        (self.min_y..self.max_y()).contains(&y)
    }

    /// Checks `pos` against the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::OutOfBounds`] if `pos.y` is outside the world.
    pub fn check(self, pos: BlockPos) -> Result<(), StoreError> {
        if self.contains_y(pos.y) {
            Ok(())
        } else {
            Err(StoreError::OutOfBounds {
                y: pos.y,
                min_y: self.min_y,
                max_y: self.max_y(),
            })
        }
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min_y: -64,
            max_y: 320,
            height: 384,
        }
    }
}
