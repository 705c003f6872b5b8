//! Voxel storage for block edit sessions: coordinates, block states, palette
//! compressed column storage with packed light, and the [`ChunkStore`]
//! contract with its in-memory implementation.

pub mod column;
pub mod coords;
pub mod light;
pub mod packed;
pub mod registry;
pub mod section;
pub mod store;
pub mod world;

pub use column::ChunkColumn;
pub use coords::{BlockPos, CHUNK_WIDTH, ChunkPos, SECTION_HEIGHT, SECTION_VOLUME, SectionSlot};
pub use light::{LightChannel, MAX_LIGHT, PackedLight};
pub use packed::PackedIndices;
pub use registry::{BlockDef, BlockRegistry, BlockState, Opacity, RegistryError};
pub use section::Section;
pub use store::{ChunkStore, StoreError, WorldBounds};
pub use world::{ColumnGenerator, FlatGenerator, VoxelWorld};
