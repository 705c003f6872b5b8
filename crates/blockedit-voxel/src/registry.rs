//! Block states and the registry describing how each state interacts with light.
//!
//! [`BlockState`] is the value stored in every block cell and carried through
//! edit sessions. Only the light engine and the world generator consult the
//! [`BlockRegistry`]; the edit pipeline treats states as opaque values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// BlockState
// ---------------------------------------------------------------------------

/// Compact, immutable identifier of a block type plus its variant data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockState(pub u16);

impl BlockState {
    /// Empty space.
    pub const AIR: Self = Self(0);
    /// Stone.
    pub const STONE: Self = Self(1);
    /// Dirt.
    pub const DIRT: Self = Self(2);
    /// Grass-covered dirt.
    pub const GRASS: Self = Self(3);
    /// Glass: solid but lets light through.
    pub const GLASS: Self = Self(4);
    /// Water: lets light through with extra attenuation.
    pub const WATER: Self = Self(5);
    /// Light-emitting block.
    pub const GLOWSTONE: Self = Self(6);

    /// Returns `true` for [`BlockState::AIR`].
    pub fn is_air(self) -> bool {
        self == Self::AIR
    }
}

// ---------------------------------------------------------------------------
// BlockDef
// ---------------------------------------------------------------------------

/// How a block interacts with light passing through it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opacity {
    /// Light passes with the normal one-level decay.
    Transparent,
    /// Light passes with one extra level of decay (water, leaves).
    Translucent,
    /// Light does not pass.
    Opaque,
}

/// Descriptor for a registered block state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Human-readable name (e.g. "stone").
    pub name: String,
    /// Light interaction.
    pub opacity: Opacity,
    /// Emitted block light level (0 = none, 15 = max).
    pub light_emission: u8,
}

impl BlockDef {
    fn new(name: &str, opacity: Opacity, light_emission: u8) -> Self {
        Self {
            name: name.to_string(),
            opacity,
            light_emission,
        }
    }
}

/// Errors that can occur during block registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A block with the same name has already been registered.
    #[error("duplicate block name: {0}")]
    DuplicateName(String),
    /// All `u16` state slots are in use.
    #[error("block registry is full (max 65536 states)")]
    RegistryFull,
    /// Emission must fit in a light nibble.
    #[error("light emission {0} exceeds 15")]
    EmissionTooHigh(u8),
}

// ---------------------------------------------------------------------------
// BlockRegistry
// ---------------------------------------------------------------------------

/// Dense table mapping [`BlockState`] to [`BlockDef`].
///
/// Air is always state 0. States that were never registered are treated as
/// opaque and non-emissive.
#[derive(Clone, Debug)]
pub struct BlockRegistry {
    defs: Vec<BlockDef>,
    by_name: HashMap<String, BlockState>,
}

impl BlockRegistry {
    /// Creates a registry containing only air.
    pub fn new() -> Self {
        let mut registry = Self {
            defs: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.push(BlockDef::new("air", Opacity::Transparent, 0));
        registry
    }

    /// Creates a registry with every built-in [`BlockState`] constant registered
    /// at its constant's index.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for def in [
            BlockDef::new("stone", Opacity::Opaque, 0),
            BlockDef::new("dirt", Opacity::Opaque, 0),
            BlockDef::new("grass", Opacity::Opaque, 0),
            BlockDef::new("glass", Opacity::Transparent, 0),
            BlockDef::new("water", Opacity::Translucent, 0),
            BlockDef::new("glowstone", Opacity::Opaque, 15),
        ] {
            registry.push(def);
        }
        registry
    }

    /// Registers a new block and returns its assigned state.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] on a duplicate name, an exhausted registry,
    /// or an emission above 15.
    pub fn register(&mut self, def: BlockDef) -> Result<BlockState, RegistryError> {
        if self.by_name.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if self.defs.len() > u16::MAX as usize {
            return Err(RegistryError::RegistryFull);
        }
        if def.light_emission > 15 {
            return Err(RegistryError::EmissionTooHigh(def.light_emission));
        }
        Ok(self.push(def))
    }

    fn push(&mut self, def: BlockDef) -> BlockState {
        let state = BlockState(self.defs.len() as u16);
        self.by_name.insert(def.name.clone(), state);
        self.defs.push(def);
        state
    }

    /// Returns the definition of `state`, if registered.
    pub fn get(&self, state: BlockState) -> Option<&BlockDef> {
        self.defs.get(state.0 as usize)
    }

    /// Looks a state up by name.
    pub fn by_name(&self, name: &str) -> Option<BlockState> {
        self.by_name.get(name).copied()
    }

    /// Light interaction of `state`; unknown states are opaque.
    pub fn opacity(&self, state: BlockState) -> Opacity {
        self.get(state).map_or(Opacity::Opaque, |def| def.opacity)
    }

    /// Emitted light level of `state`; unknown states emit nothing.
    pub fn emission(&self, state: BlockState) -> u8 {
        self.get(state).map_or(0, |def| def.light_emission)
    }

    /// Number of registered states, including air.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Always `false`: air is registered at construction.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
