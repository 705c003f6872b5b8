//! Fixed-width palette indices packed into `u64` words.
//!
//! Widths are restricted to 0, 2, 4, 8 and 16 bits so an element never
//! straddles a word boundary. Width 0 stores nothing and reads back zero,
//! which is how uniform sections cost no index memory.

use serde::{Deserialize, Serialize};

/// Valid element widths.
pub const VALID_WIDTHS: [u8; 5] = [0, 2, 4, 8, 16];

/// Packed array of `len` unsigned indices, each `bits` wide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedIndices {
    bits: u8,
    len: usize,
    words: Vec<u64>,
}

impl PackedIndices {
    /// Creates an all-zero array.
    pub fn zeroed(bits: u8, len: usize) -> Self {
        debug_assert!(VALID_WIDTHS.contains(&bits), "invalid width {bits}");
        Self {
            bits,
            len,
            words: vec![0; Self::word_count(bits, len)],
        }
    }

    /// Number of words needed for `len` elements at `bits` each.
    pub fn word_count(bits: u8, len: usize) -> usize {
        if bits == 0 {
            0
        } else {
            len.div_ceil(64 / bits as usize)
        }
    }

    /// Reads element `i`.
    pub fn get(&self, i: usize) -> u16 {
        debug_assert!(i < self.len);
        if self.bits == 0 {
            return 0;
        }
        let per_word = 64 / self.bits as usize;
        let shift = (i % per_word) * self.bits as usize;
        ((self.words[i / per_word] >> shift) & self.mask()) as u16
    }

    /// Writes element `i`. `value` must fit in the current width.
    pub fn set(&mut self, i: usize, value: u16) {
        debug_assert!(i < self.len);
        if self.bits == 0 {
            debug_assert_eq!(value, 0, "zero-width array can only hold 0");
            return;
        }
        debug_assert!(u64::from(value) <= self.mask());
        let per_word = 64 / self.bits as usize;
        let shift = (i % per_word) * self.bits as usize;
        let mask = self.mask();
        let word = &mut self.words[i / per_word];
        *word = (*word & !(mask << shift)) | (u64::from(value) << shift);
    }

    /// Copies every element into a new array of a wider width.
    pub fn widened(&self, bits: u8) -> Self {
        debug_assert!(bits >= self.bits);
        let mut wide = Self::zeroed(bits, self.len);
        if self.bits > 0 {
            for i in 0..self.len {
                wide.set(i, self.get(i));
            }
        }
        wide
    }

    /// Element width in bits.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw backing words.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    fn mask(&self) -> u64 {
        (1u64 << self.bits) - 1
    }
}

/// Smallest valid width able to index a palette of `palette_len` entries.
pub fn width_for_palette(palette_len: usize) -> u8 {
    match palette_len {
        0 | 1 => 0,
        2..=4 => 2,
        5..=16 => 4,
        17..=256 => 8,
        _ => 16,
    }
}
