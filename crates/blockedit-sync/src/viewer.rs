//! Viewers and the registry edit sessions enumerate at commit time.

use std::fmt;

use blockedit_voxel::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Viewer
// ---------------------------------------------------------------------------

/// Stable identifier of a connected viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewerId(pub u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// A viewer as seen at one instant: where it is looking from and how far.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// Identity used to route packets.
    pub id: ViewerId,
    /// Column the viewer's view is centred on.
    pub center: ChunkPos,
    /// View distance in chunks.
    pub view_radius: u32,
}

impl Viewer {
    pub fn new(id: ViewerId, center: ChunkPos, view_radius: u32) -> Self {
        Self {
            id,
            center,
            view_radius,
        }
    }

    /// A viewer centred on the column holding `pos`.
    pub fn at_block(id: ViewerId, pos: BlockPos, view_radius: u32) -> Self {
        Self::new(id, pos.chunk_pos(), view_radius)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Source of the viewers a commit broadcasts to.
pub trait ViewerRegistry {
    /// Point-in-time copy of every current viewer. Later changes to the
    /// registry do not affect the returned list.
    fn current_viewers(&self) -> Vec<Viewer>;
}

/// In-memory registry keeping viewers in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ViewerList {
    viewers: Vec<Viewer>,
}

impl ViewerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `viewer`, replacing any existing viewer with the same id in place.
    pub fn add(&mut self, viewer: Viewer) {
        match self.viewers.iter_mut().find(|v| v.id == viewer.id) {
            Some(existing) => *existing = viewer,
            None => self.viewers.push(viewer),
        }
    }

    /// Removes a viewer, returning it if it was present.
    pub fn remove(&mut self, id: ViewerId) -> Option<Viewer> {
        let index = self.viewers.iter().position(|v| v.id == id)?;
        Some(self.viewers.remove(index))
    }

    /// Re-centres a viewer. Returns `false` if the viewer is unknown.
    pub fn move_to(&mut self, id: ViewerId, center: ChunkPos) -> bool {
        match self.get_mut(id) {
            Some(viewer) => {
                viewer.center = center;
                true
            }
            None => false,
        }
    }

    /// Changes a viewer's view distance. Returns `false` if the viewer is
    /// unknown.
    pub fn set_radius(&mut self, id: ViewerId, view_radius: u32) -> bool {
        match self.get_mut(id) {
            Some(viewer) => {
                viewer.view_radius = view_radius;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ViewerId) -> Option<&Viewer> {
        self.viewers.iter().find(|v| v.id == id)
    }

    fn get_mut(&mut self, id: ViewerId) -> Option<&mut Viewer> {
        self.viewers.iter_mut().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Viewer> {
        self.viewers.iter()
    }
}

impl ViewerRegistry for ViewerList {
    fn current_viewers(&self) -> Vec<Viewer> {
        self.viewers.clone()
    }
}

impl FromIterator<Viewer> for ViewerList {
    fn from_iter<I: IntoIterator<Item = Viewer>>(iter: I) -> Self {
        let mut list = Self::new();
        for viewer in iter {
            list.add(viewer);
        }
        list
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
