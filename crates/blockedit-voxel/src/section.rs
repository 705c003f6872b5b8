//! Palette-compressed storage for one 16×16×16 column section.
//!
//! Blocks are stored as indices into a local palette of distinct
//! [`BlockState`] values. The index width grows with the palette, so a
//! section holding a single state uses no index memory at all.

use crate::coords::SECTION_VOLUME;
use crate::light::PackedLight;
use crate::packed::{PackedIndices, width_for_palette};
use crate::registry::BlockState;

/// Blocks and light for one section.
#[derive(Clone, Debug)]
pub struct Section {
    palette: Vec<BlockState>,
    indices: PackedIndices,
    light: Box<[PackedLight]>,
}

impl Section {
    /// Creates a section filled with `state` and no light.
    pub fn filled(state: BlockState) -> Self {
        Self {
            palette: vec![state],
            indices: PackedIndices::zeroed(0, SECTION_VOLUME),
            light: vec![PackedLight::DARK; SECTION_VOLUME].into_boxed_slice(),
        }
    }

    /// Returns the state at linear index `i`.
    pub fn block(&self, i: usize) -> BlockState {
        self.palette[self.indices.get(i) as usize]
    }

    /// Writes `state` at linear index `i`, returning the previous state.
    pub fn set_block(&mut self, i: usize, state: BlockState) -> BlockState {
        let previous = self.block(i);
        if previous == state {
            return previous;
        }
        let palette_index = self.palette_index_or_insert(state);
        self.indices.set(i, palette_index);
        previous
    }

    /// Returns the light at linear index `i`.
    pub fn light(&self, i: usize) -> PackedLight {
        self.light[i]
    }

    /// Writes the light at linear index `i`.
    pub fn set_light(&mut self, i: usize, light: PackedLight) {
        self.light[i] = light;
    }

    /// Palette of distinct states referenced by the indices.
    pub fn palette(&self) -> &[BlockState] {
        &self.palette
    }

    /// Packed palette indices.
    pub fn indices(&self) -> &PackedIndices {
        &self.indices
    }

    /// Per-block light, in linear index order.
    pub fn light_data(&self) -> &[PackedLight] {
        &self.light
    }

    /// Returns `true` if every block has the same state.
    pub fn is_uniform(&self) -> bool {
        self.indices.bits() == 0
    }

    fn palette_index_or_insert(&mut self, state: BlockState) -> u16 {
        if let Some(i) = self.palette.iter().position(|&s| s == state) {
            return i as u16;
        }
        let bits = width_for_palette(self.palette.len() + 1);
        if bits != self.indices.bits() {
            self.indices = self.indices.widened(bits);
        }
        self.palette.push(state);
        (self.palette.len() - 1) as u16
    }
}
