//! Packed per-block light levels.
//!
//! Each block stores two 4-bit channels in one byte: sky light in the high
//! nibble, block (emitted) light in the low nibble.

use serde::{Deserialize, Serialize};

/// Highest level either channel can hold.
pub const MAX_LIGHT: u8 = 15;

/// The two independent light channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    /// Light arriving from the open sky.
    Sky,
    /// Light emitted by blocks.
    Block,
}

/// Sky and block light for one block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedLight(pub u8);

impl PackedLight {
    /// No light in either channel.
    pub const DARK: Self = Self(0);

    /// Builds a value from both levels.
    pub fn new(sky: u8, block: u8) -> Self {
        debug_assert!(sky <= MAX_LIGHT && block <= MAX_LIGHT);
        Self((sky << 4) | (block & 0x0F))
    }

    /// Sky light level.
    pub fn sky(self) -> u8 {
        self.0 >> 4
    }

    /// Block light level.
    pub fn block(self) -> u8 {
        self.0 & 0x0F
    }

    /// Level of the given channel.
    pub fn level(self, channel: LightChannel) -> u8 {
        match channel {
            LightChannel::Sky => self.sky(),
            LightChannel::Block => self.block(),
        }
    }

    /// Returns a copy with `channel` set to `level`.
    pub fn with_level(self, channel: LightChannel, level: u8) -> Self {
        debug_assert!(level <= MAX_LIGHT);
        match channel {
            LightChannel::Sky => Self((self.0 & 0x0F) | (level << 4)),
            LightChannel::Block => Self((self.0 & 0xF0) | (level & 0x0F)),
        }
    }
}
