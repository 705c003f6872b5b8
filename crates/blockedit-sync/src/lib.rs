//! Viewer-side half of block edit sessions: who is watching, which chunks
//! they may receive, and how chunk snapshots are encoded and delivered.

pub mod codec;
pub mod snapshot;
pub mod viewer;
pub mod visibility;

pub use codec::{ChannelSink, ChunkSnapshotCodec, PacketSink, SendError, SnapshotCodec};
pub use snapshot::{
    ChunkSnapshot, ChunkSnapshotPacket, CodecError, MAX_SNAPSHOT_BYTES, MAX_SNAPSHOT_SECTIONS,
    SectionSnapshot,
};
pub use viewer::{Viewer, ViewerId, ViewerList, ViewerRegistry};
pub use visibility::{VIEW_MARGIN, is_visible};
