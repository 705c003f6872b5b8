//! Incremental flood-fill relighting over a [`VoxelWorld`].
//!
//! Both channels are relit independently with the usual two-pass approach:
//! a removal BFS clears every level that was fed by the old value at the
//! edited position, then an addition BFS refills from the surviving border,
//! from block emission, and from the open sky at the top of the world.
//!
//! Light decays by 1 per step through transparent blocks and by 2 through
//! translucent ones; opaque blocks stop it. Sky light at full strength moves
//! straight down through transparent blocks without decaying.
//!
//! Only resident columns are touched. Light that would cross into an
//! unloaded column is dropped, so lighting next to unloaded regions can be
//! wrong until those columns are relit.

use std::collections::VecDeque;

use blockedit_voxel::{
    BlockPos, ChunkStore, LightChannel, MAX_LIGHT, Opacity, VoxelWorld,
};

use crate::engine::{LightEngine, LightError};

/// The six axis-aligned neighbour offsets.
const FACES: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

const DOWN: (i32, i32, i32) = (0, -1, 0);

/// BFS light engine for [`VoxelWorld`]. Queues are reused between calls.
#[derive(Debug, Default)]
pub struct FloodLightEngine {
    removal: VecDeque<(BlockPos, u8)>,
    addition: VecDeque<BlockPos>,
    recomputed: u64,
}

impl FloodLightEngine {
    /// Creates an engine with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful [`recompute_at`](LightEngine::recompute_at) calls.
    pub fn recomputed_count(&self) -> u64 {
        self.recomputed
    }

    fn relight(&mut self, world: &mut VoxelWorld, pos: BlockPos, channel: LightChannel) {
        self.removal.clear();
        self.addition.clear();

        let Some(old) = level(world, pos, channel) else {
            return;
        };
        set_level(world, pos, channel, 0);
        if old > 0 {
            self.removal.push_back((pos, old));
        }

        while let Some((p, from)) = self.removal.pop_front() {
            for face in FACES {
                let n = p.offset(face.0, face.1, face.2);
                let Some(current) = level(world, n, channel) else {
                    continue;
                };
                if current == 0 {
                    continue;
                }
                let skylight_column = channel == LightChannel::Sky
                    && face == DOWN
                    && from == MAX_LIGHT
                    && current == MAX_LIGHT;
                if current < from || skylight_column {
                    set_level(world, n, channel, 0);
                    self.removal.push_back((n, current));
                    let source = source_level(world, n, channel);
                    if source > 0 {
                        set_level(world, n, channel, source);
                        self.addition.push_back(n);
                    }
                } else {
                    self.addition.push_back(n);
                }
            }
        }

        let source = source_level(world, pos, channel);
        if source > 0 {
            set_level(world, pos, channel, source);
            self.addition.push_back(pos);
        }
        for face in FACES {
            let n = pos.offset(face.0, face.1, face.2);
            if level(world, n, channel).is_some_and(|l| l > 0) {
                self.addition.push_back(n);
            }
        }

        while let Some(p) = self.addition.pop_front() {
            let Some(from) = level(world, p, channel) else {
                continue;
            };
            if from == 0 {
                continue;
            }
            for face in FACES {
                let n = p.offset(face.0, face.1, face.2);
                let Some(current) = level(world, n, channel) else {
                    continue;
                };
                let opacity = world.registry().opacity(world.block_at(n));
                if opacity == Opacity::Opaque {
                    continue;
                }
                let next = if channel == LightChannel::Sky
                    && face == DOWN
                    && from == MAX_LIGHT
                    && opacity == Opacity::Transparent
                {
                    MAX_LIGHT
                } else {
                    from.saturating_sub(decay(opacity))
                };
                if next > current {
                    set_level(world, n, channel, next);
                    self.addition.push_back(n);
                }
            }
        }
    }
}

impl LightEngine<VoxelWorld> for FloodLightEngine {
    fn recompute_at(&mut self, world: &mut VoxelWorld, pos: BlockPos) -> Result<(), LightError> {
        if !world.bounds().contains_y(pos.y) {
            return Err(LightError::OutOfBounds { pos });
        }
        if !world.is_loaded(pos.chunk_pos()) {
            return Err(LightError::NotLoaded { pos });
        }
        self.relight(world, pos, LightChannel::Block);
        self.relight(world, pos, LightChannel::Sky);
        self.recomputed += 1;
        tracing::trace!(pos = %pos, "relit");
        Ok(())
    }
}

fn level(world: &VoxelWorld, pos: BlockPos, channel: LightChannel) -> Option<u8> {
    world.light_at(pos).map(|light| light.level(channel))
}

fn set_level(world: &mut VoxelWorld, pos: BlockPos, channel: LightChannel, value: u8) {
    if let Some(light) = world.light_at(pos) {
        world.set_light(pos, light.with_level(channel, value));
    }
}

/// Light a position produces on its own, independent of neighbours.
fn source_level(world: &VoxelWorld, pos: BlockPos, channel: LightChannel) -> u8 {
    let state = world.block_at(pos);
    match channel {
        LightChannel::Block => world.registry().emission(state),
        LightChannel::Sky => {
            if pos.y != world.bounds().max_y() - 1 {
                return 0;
            }
            match world.registry().opacity(state) {
                Opacity::Transparent => MAX_LIGHT,
                Opacity::Translucent => MAX_LIGHT - 1,
                Opacity::Opaque => 0,
            }
        }
    }
}

fn decay(opacity: Opacity) -> u8 {
    match opacity {
        Opacity::Transparent => 1,
        Opacity::Translucent => 2,
        Opacity::Opaque => MAX_LIGHT,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
