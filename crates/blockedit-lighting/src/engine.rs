//! The light engine contract consumed by edit sessions.

use blockedit_voxel::BlockPos;
use thiserror::Error;

/// Recomputes stored light after blocks change.
///
/// The store is passed per call so the engine never shares ownership of the
/// world with the session that drives it.
pub trait LightEngine<S: ?Sized> {
    /// Recomputes light at `pos` and every position whose light depended on it.
    ///
    /// # Errors
    ///
    /// Returns [`LightError`] if `pos` cannot be relit. Callers treat this as
    /// a per-position, non-fatal failure.
    fn recompute_at(&mut self, store: &mut S, pos: BlockPos) -> Result<(), LightError>;
}

/// Errors produced while relighting a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightError {
    /// The position is above or below the world.
    #[error("cannot relight {pos}: outside world height")]
    OutOfBounds {
        /// Requested position.
        pos: BlockPos,
    },
    /// The column holding the position is not resident.
    #[error("cannot relight {pos}: chunk not loaded")]
    NotLoaded {
        /// Requested position.
        pos: BlockPos,
    },
}
