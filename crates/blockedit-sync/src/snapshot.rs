//! Full-chunk snapshots and the packets that carry them.
//!
//! A [`ChunkSnapshot`] copies one column's sections (palette, packed indices
//! and light) at a point in time. On the wire it is postcard-encoded and LZ4
//! compressed with the uncompressed size prepended. The resulting
//! [`ChunkSnapshotPacket`] keeps its payload behind an [`Arc`] so one packet
//! can be handed to any number of viewers without copying.

use std::sync::Arc;

use blockedit_voxel::packed::VALID_WIDTHS;
use blockedit_voxel::{
    BlockPos, BlockState, ChunkColumn, ChunkPos, PackedIndices, PackedLight, SECTION_VOLUME,
};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most sections a snapshot may carry, 16384 blocks of height.
pub const MAX_SNAPSHOT_SECTIONS: usize = 1024;

/// Upper bound on one encoded section: a full palette, 16-bit indices at
/// worst-case varint width, and the light bytes, with headroom.
const MAX_SECTION_BYTES: usize = 32 * 1024;

/// Largest uncompressed payload [`ChunkSnapshotPacket::decode`] will inflate.
pub const MAX_SNAPSHOT_BYTES: usize = MAX_SNAPSHOT_SECTIONS * MAX_SECTION_BYTES;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or reading a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The chunk is not resident in the store.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkPos),
    /// Serialization failed.
    #[error("snapshot encoding failed: {0}")]
    Encode(String),
    /// The payload did not decode to a well-formed snapshot.
    #[error("snapshot decoding failed: {0}")]
    Decode(String),
    /// LZ4 decompression failed.
    #[error("LZ4 decompression failed: {0}")]
    Decompress(String),
}

// ---------------------------------------------------------------------------
// ChunkSnapshot
// ---------------------------------------------------------------------------

/// One section as sent to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSnapshot {
    /// Distinct states referenced by `indices`.
    pub palette: Vec<BlockState>,
    /// Palette index per block.
    pub indices: PackedIndices,
    /// Packed light byte per block (sky high nibble, block low nibble).
    pub light: Vec<u8>,
}

/// Complete contents of one column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    /// Which column this is.
    pub chunk: ChunkPos,
    /// Column mutation counter at capture time.
    pub version: u64,
    /// Lowest block Y in the column.
    pub min_y: i32,
    /// Sections from bottom to top.
    pub sections: Vec<SectionSnapshot>,
}

impl ChunkSnapshot {
    /// Copies the current state of `column`.
    pub fn capture(column: &ChunkColumn) -> Self {
        let sections = column
            .sections()
            .iter()
            .map(|section| SectionSnapshot {
                palette: section.palette().to_vec(),
                indices: section.indices().clone(),
                light: section.light_data().iter().map(|l| l.0).collect(),
            })
            .collect();
        Self {
            chunk: column.pos(),
            version: column.version(),
            min_y: column.min_y(),
            sections,
        }
    }

    /// Block state at `pos`, or `None` if `pos` is not in this chunk.
    pub fn block(&self, pos: BlockPos) -> Option<BlockState> {
        let (section, index) = self.locate(pos)?;
        let palette_index = section.indices.get(index) as usize;
        section.palette.get(palette_index).copied()
    }

    /// Light at `pos`, or `None` if `pos` is not in this chunk.
    pub fn light(&self, pos: BlockPos) -> Option<PackedLight> {
        let (section, index) = self.locate(pos)?;
        Some(PackedLight(section.light[index]))
    }

    fn locate(&self, pos: BlockPos) -> Option<(&SectionSnapshot, usize)> {
        if !self.chunk.contains(pos) {
            return None;
        }
        let slot = pos.section_slot(self.min_y, self.sections.len())?;
        Some((&self.sections[slot.section], slot.index))
    }

    /// Checks the structural invariants a decoded snapshot must hold before
    /// it can be queried.
    fn validate(&self) -> Result<(), CodecError> {
        for (i, section) in self.sections.iter().enumerate() {
            let indices = &section.indices;
            if section.palette.is_empty() {
                return Err(CodecError::Decode(format!("section {i}: empty palette")));
            }
            if !VALID_WIDTHS.contains(&indices.bits())
                || indices.len() != SECTION_VOLUME
                || indices.words().len() != PackedIndices::word_count(indices.bits(), indices.len())
            {
                return Err(CodecError::Decode(format!("section {i}: malformed indices")));
            }
            if section.light.len() != SECTION_VOLUME {
                return Err(CodecError::Decode(format!(
                    "section {i}: expected {SECTION_VOLUME} light bytes, got {}",
                    section.light.len()
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ChunkSnapshotPacket
// ---------------------------------------------------------------------------

/// Encoded snapshot ready to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkSnapshotPacket {
    chunk: ChunkPos,
    version: u64,
    payload: Arc<[u8]>,
    uncompressed_size: usize,
}

impl ChunkSnapshotPacket {
    /// Wraps an already encoded payload.
    pub fn new(chunk: ChunkPos, version: u64, payload: Arc<[u8]>, uncompressed_size: usize) -> Self {
        Self {
            chunk,
            version,
            payload,
            uncompressed_size,
        }
    }

    /// Serializes and compresses `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if serialization fails or the snapshot
    /// has more than [`MAX_SNAPSHOT_SECTIONS`] sections.
    pub fn encode(snapshot: &ChunkSnapshot) -> Result<Self, CodecError> {
        if snapshot.sections.len() > MAX_SNAPSHOT_SECTIONS {
            return Err(CodecError::Encode(format!(
                "{} sections exceeds the limit of {MAX_SNAPSHOT_SECTIONS}",
                snapshot.sections.len()
            )));
        }
        let bytes = postcard::to_allocvec(snapshot).map_err(|e| CodecError::Encode(e.to_string()))?;
        let compressed = compress_prepend_size(&bytes);
        Ok(Self::new(
            snapshot.chunk,
            snapshot.version,
            compressed.into(),
            bytes.len(),
        ))
    }

    /// Decompresses and deserializes the payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decompress`] or [`CodecError::Decode`] if the
    /// payload is corrupt or does not describe this packet's chunk.
    /// Payloads claiming more than [`MAX_SNAPSHOT_BYTES`] are rejected before
    /// anything is allocated.
    pub fn decode(&self) -> Result<ChunkSnapshot, CodecError> {
        let Some(prefix) = self.payload.first_chunk::<4>() else {
            return Err(CodecError::Decompress("payload shorter than its size prefix".into()));
        };
        let claimed = u32::from_le_bytes(*prefix) as usize;
        if claimed > MAX_SNAPSHOT_BYTES {
            return Err(CodecError::Decompress(format!(
                "claimed size {claimed} exceeds {MAX_SNAPSHOT_BYTES}"
            )));
        }
        let bytes = decompress_size_prepended(&self.payload)
            .map_err(|e| CodecError::Decompress(e.to_string()))?;
        let snapshot: ChunkSnapshot =
            postcard::from_bytes(&bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        if snapshot.chunk != self.chunk {
            return Err(CodecError::Decode(format!(
                "payload is for chunk {}, packet header says {}",
                snapshot.chunk, self.chunk
            )));
        }
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn chunk(&self) -> ChunkPos {
        self.chunk
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Compressed wire bytes, shared between every clone of this packet.
    pub fn payload(&self) -> &Arc<[u8]> {
        &self.payload
    }

    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_size
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
