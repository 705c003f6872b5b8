//! Batched block editing: stage many block writes, then commit them in one
//! pass that updates storage, relights, and broadcasts full chunk snapshots
//! to nearby viewers.
//!
//! ```no_run
//! use blockedit_lighting::FloodLightEngine;
//! use blockedit_session::{EditSession, WorldSession};
//! use blockedit_sync::{ChannelSink, SnapshotCodec, ViewerList};
//! use blockedit_voxel::{BlockPos, BlockState, VoxelWorld, WorldBounds};
//!
//! let world = VoxelWorld::flat(WorldBounds::default(), 64);
//! let codec = SnapshotCodec::new(ChannelSink::new());
//! let mut session: WorldSession =
//!     EditSession::new(world, FloodLightEngine::new(), ViewerList::new(), codec);
//!
//! session.set_block(BlockPos::new(0, 64, 0), BlockState::STONE);
//! let report = session.commit(true)?;
//! assert_eq!(report.touched_chunks.len(), 1);
//! # Ok::<(), blockedit_session::CommitError>(())
//! ```

pub mod report;
pub mod session;
pub mod staging;

pub use report::{CommitError, CommitFailure, CommitReport};
pub use session::{EditSession, WorldSession};
pub use staging::StagingBuffer;
