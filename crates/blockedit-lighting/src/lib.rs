//! Light recomputation for edited blocks.
//!
//! [`LightEngine`] is the seam edit sessions call once per edited position;
//! [`FloodLightEngine`] is the incremental BFS implementation over
//! [`VoxelWorld`](blockedit_voxel::VoxelWorld).

pub mod engine;
pub mod flood;

pub use engine::{LightEngine, LightError};
pub use flood::FloodLightEngine;
