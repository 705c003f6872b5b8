//! Which chunks a viewer is eligible to receive.

use blockedit_voxel::ChunkPos;

use crate::viewer::Viewer;

/// Extra ring of chunks beyond the view radius that still receives updates,
/// so chunks just entering view are already current.
pub const VIEW_MARGIN: u64 = 1;

/// Returns `true` if `chunk` lies within the square of half-width
/// `view_radius + VIEW_MARGIN` centred on the viewer.
///
/// Both axes are compared independently in 64-bit arithmetic, so any `i32`
/// coordinates and `u32` radius are handled without overflow.
pub fn is_visible(viewer: &Viewer, chunk: ChunkPos) -> bool {
    let reach = u64::from(viewer.view_radius) + VIEW_MARGIN;
    viewer.center.chebyshev_distance(chunk) <= reach
}
