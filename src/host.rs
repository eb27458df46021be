//! Host collaborator interface and world geometry.
//!
//! ARCHITECTURE
//! ============
//! The host environment owns the world: it allocates display surfaces, spawns
//! display-frames at cells, answers solidity queries, and carries tile data to
//! viewers. This core never touches any of that directly — every world-facing
//! effect goes through [`SurfaceHost`], which keeps the placement and
//! distribution logic testable against an in-memory double.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tile::DecodedImage;

/// Host-assigned identifier of one display surface.
pub type SurfaceId = i32;

// =============================================================================
// GEOMETRY
// =============================================================================

/// One unit cell in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Cell {
    #[must_use]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The cell displaced by the given deltas.
    #[must_use]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, z: self.z + dz }
    }
}

/// Face of a cell an interaction was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Facing {
    /// Horizontal step `(dx, dz)` between neighbouring grid columns when an
    /// image hangs on this face. Only the four cardinal faces can hold a
    /// placement; `Up`/`Down` yield `None`.
    #[must_use]
    pub fn lateral_step(self) -> Option<(i32, i32)> {
        match self {
            Facing::East => Some((0, -1)),
            Facing::West => Some((0, 1)),
            Facing::South => Some((1, 0)),
            Facing::North => Some((-1, 0)),
            Facing::Up | Facing::Down => None,
        }
    }

    /// Outward normal `(dx, dz)` of this face. Frames hang one cell out from
    /// their support cell along this vector.
    #[must_use]
    pub fn normal(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::South => (0, 1),
            Facing::East => (1, 0),
            Facing::West => (-1, 0),
            Facing::Up | Facing::Down => (0, 0),
        }
    }
}

// =============================================================================
// HOST TRAIT
// =============================================================================

/// World-facing operations supplied by the host environment.
///
/// All calls are synchronous: in the host's dispatch model world mutation
/// happens on the event thread, so implementations must not block on I/O.
pub trait SurfaceHost: Send + Sync {
    /// Allocate a fresh display surface and return its identifier.
    fn allocate_surface(&self) -> SurfaceId;

    /// Remove every renderer currently attached to a surface.
    fn clear_renderers(&self, id: SurfaceId);

    /// Attach a tile renderer drawing `image` at the given pixel offset.
    fn bind_renderer(&self, id: SurfaceId, image: &DecodedImage, offset_x: u32, offset_y: u32);

    /// Whether the cell is solid enough to support a display-frame.
    fn is_solid(&self, cell: Cell) -> bool;

    /// Clear the cell a display-frame is about to occupy.
    fn clear_cell(&self, cell: Cell);

    /// Spawn a display-frame at `cell`, oriented to `facing`, holding the
    /// surface's item.
    fn create_frame(&self, cell: Cell, facing: Facing, id: SurfaceId);

    /// Proactively push a surface's current tile data to all viewers.
    fn push_to_viewers(&self, id: SurfaceId);

    /// Deliver a user-facing message to an actor.
    fn notify(&self, actor_id: Uuid, message: &str);
}
