//! Building snapshot packets and delivering them to viewers.

use blockedit_voxel::{ChunkPos, VoxelWorld};
use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::snapshot::{ChunkSnapshot, ChunkSnapshotPacket, CodecError};
use crate::viewer::{Viewer, ViewerId};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Errors raised while handing a packet to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// No delivery route exists for the viewer.
    #[error("no connection for {0}")]
    UnknownViewer(ViewerId),
    /// The viewer's connection is gone.
    #[error("{0} disconnected")]
    Disconnected(ViewerId),
}

/// Turns chunks from store `S` into packets and sends them.
///
/// Sends are fire and forget: a successful return means the packet was
/// handed off, not that the viewer received it.
pub trait ChunkSnapshotCodec<S: ?Sized> {
    /// Captures the current contents of `chunk` into a packet.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the chunk cannot be read or encoded.
    fn build_snapshot(&mut self, store: &S, chunk: ChunkPos) -> Result<ChunkSnapshotPacket, CodecError>;

    /// Hands `packet` to `viewer`'s connection.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the viewer cannot be reached.
    fn send(&mut self, viewer: &Viewer, packet: &ChunkSnapshotPacket) -> Result<(), SendError>;
}

/// Per-viewer packet transport.
pub trait PacketSink {
    /// Delivers `packet` to the viewer with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the viewer cannot be reached.
    fn deliver(&mut self, id: ViewerId, packet: &ChunkSnapshotPacket) -> Result<(), SendError>;
}

// ---------------------------------------------------------------------------
// ChannelSink
// ---------------------------------------------------------------------------

/// Delivers packets over one unbounded crossbeam channel per viewer.
#[derive(Debug, Default)]
pub struct ChannelSink {
    senders: FxHashMap<ViewerId, Sender<ChunkSnapshotPacket>>,
}

impl ChannelSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a channel for `id`, replacing any previous one, and returns the
    /// receiving end.
    pub fn connect(&mut self, id: ViewerId) -> Receiver<ChunkSnapshotPacket> {
        let (tx, rx) = unbounded();
        self.senders.insert(id, tx);
        tracing::debug!(viewer = %id, "viewer connected");
        rx
    }

    /// Drops the sending end for `id`. Returns `false` if there was none.
    pub fn disconnect(&mut self, id: ViewerId) -> bool {
        self.senders.remove(&id).is_some()
    }

    /// Returns `true` if `id` has a channel. A receiver dropped on the other
    /// end is only noticed on the next delivery.
    pub fn is_connected(&self, id: ViewerId) -> bool {
        self.senders.contains_key(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }
}

impl PacketSink for ChannelSink {
    fn deliver(&mut self, id: ViewerId, packet: &ChunkSnapshotPacket) -> Result<(), SendError> {
        let tx = self.senders.get(&id).ok_or(SendError::UnknownViewer(id))?;
        match tx.try_send(packet.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Disconnected(_)) => {
                self.senders.remove(&id);
                Err(SendError::Disconnected(id))
            }
            // Unbounded channels never report full.
            Err(TrySendError::Full(_)) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// SnapshotCodec
// ---------------------------------------------------------------------------

/// Postcard + LZ4 codec over [`VoxelWorld`], sending through a [`PacketSink`].
#[derive(Debug, Default)]
pub struct SnapshotCodec<K = ChannelSink> {
    sink: K,
    built: u64,
    sent: u64,
}

impl<K: PacketSink> SnapshotCodec<K> {
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            built: 0,
            sent: 0,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Packets built since creation.
    pub fn built_count(&self) -> u64 {
        self.built
    }

    /// Packets successfully handed to the sink since creation.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }
}

impl<K: PacketSink> ChunkSnapshotCodec<VoxelWorld> for SnapshotCodec<K> {
    fn build_snapshot(
        &mut self,
        world: &VoxelWorld,
        chunk: ChunkPos,
    ) -> Result<ChunkSnapshotPacket, CodecError> {
        let column = world.column(chunk).ok_or(CodecError::ChunkNotLoaded(chunk))?;
        let packet = ChunkSnapshotPacket::encode(&ChunkSnapshot::capture(column))?;
        self.built += 1;
        tracing::trace!(
            chunk = %chunk,
            compressed = packet.payload().len(),
            uncompressed = packet.uncompressed_size(),
            "built chunk snapshot"
        );
        Ok(packet)
    }

    fn send(&mut self, viewer: &Viewer, packet: &ChunkSnapshotPacket) -> Result<(), SendError> {
        self.sink.deliver(viewer.id, packet)?;
        self.sent += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
