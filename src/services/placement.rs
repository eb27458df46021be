//! Placement engine — two-pass tile grid placement.
//!
//! DESIGN
//! ======
//! An actor first records an intent (`start_placing`), then triggers it by
//! interacting with a world cell. Placement validates structural support for
//! the whole grid before touching anything: the validation pass performs no
//! mutation, so a failed placement leaves zero frames and zero new surfaces
//! behind. Only after every support cell checks out does the commit pass
//! allocate surfaces, clear cells, and spawn frames.
//!
//! ERROR HANDLING
//! ==============
//! Every placement error is converted into a message for the acting user at
//! the trigger boundary; none propagate to the host as fatal. The pending
//! intent is consumed exactly once, success or failure.

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::host::{Cell, Facing};
use crate::services::{cache, persistence};
use crate::services::cache::CacheError;
use crate::state::{AppState, PendingPlacement};
use crate::tile::{TILE_HEIGHT, TILE_WIDTH, grid_dimensions};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PlaceError {
    #[error("images can only be placed against a side face")]
    InvalidFacing,
    #[error("not every cell behind the image is solid")]
    UnsupportedSurface,
    #[error("image could not be loaded: {0}")]
    Image(#[from] CacheError),
}

/// Summary of a committed placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placed {
    pub columns: u32,
    pub rows: u32,
}

// =============================================================================
// INTENT
// =============================================================================

/// Record that an actor is about to place `source`. Overwrites any intent the
/// actor already had pending.
pub async fn start_placing(state: &AppState, actor_id: Uuid, source: &str, fast_send: bool) {
    let mut pending = state.pending.write().await;
    pending.insert(actor_id, PendingPlacement { source: source.to_owned(), fast_send });
    debug!(%actor_id, source, fast_send, "placement intent recorded");
}

/// Consume the actor's pending intent, if any.
pub async fn take_pending(state: &AppState, actor_id: Uuid) -> Option<PendingPlacement> {
    state.pending.write().await.remove(&actor_id)
}

// =============================================================================
// PLACEMENT
// =============================================================================

/// Place the pending image as a tile grid anchored at `anchor`, hanging on
/// the `face` side.
///
/// # Errors
///
/// `InvalidFacing` for non-lateral faces, `Image` when the source cannot be
/// resolved, `UnsupportedSurface` when any grid cell lacks support. No
/// partial state is created on any error path.
pub async fn place(
    state: &AppState,
    anchor: Cell,
    face: Facing,
    pending: &PendingPlacement,
) -> Result<Placed, PlaceError> {
    let Some(step) = face.lateral_step() else {
        return Err(PlaceError::InvalidFacing);
    };

    let image = cache::get(state, &pending.source).await?;
    let (columns, rows) = grid_dimensions(image.width, image.height);

    // PHASE: VALIDATE
    // Support check for the whole grid before any mutation, so failure is
    // all-or-nothing.
    for col in 0..columns {
        for row in 0..rows {
            if !state.host.is_solid(support_cell(anchor, step, col, row)) {
                return Err(PlaceError::UnsupportedSurface);
            }
        }
    }

    // PHASE: COMMIT
    let (normal_x, normal_z) = face.normal();
    let mut registry = state.registry.write().await;
    for col in 0..columns {
        for row in 0..rows {
            let id = registry.get_or_create_surface(
                state.host.as_ref(),
                &pending.source,
                col * TILE_WIDTH,
                row * TILE_HEIGHT,
                &image,
                pending.fast_send,
            );

            let frame_cell = support_cell(anchor, step, col, row).offset(normal_x, 0, normal_z);
            state.host.clear_cell(frame_cell);
            state.host.create_frame(frame_cell, face, id);

            if pending.fast_send {
                state.send_queue.enqueue(id);
            }
        }
    }

    info!(source = %pending.source, columns, rows, "image placed");
    Ok(Placed { columns, rows })
}

/// Handle an actor's trigger interaction. Consumes the pending intent exactly
/// once and reports the outcome to the actor; returns whether an intent was
/// consumed.
pub async fn handle_trigger(state: &AppState, actor_id: Uuid, anchor: Cell, face: Facing) -> bool {
    let Some(pending) = take_pending(state, actor_id).await else {
        return false;
    };

    match place(state, anchor, face, &pending).await {
        Ok(placed) => {
            state.host.notify(
                actor_id,
                &format!("Placed {} ({}x{} tiles).", pending.source, placed.columns, placed.rows),
            );
            if let Err(e) = persistence::save(state).await {
                error!(error = %e, "surface snapshot save failed");
            }
        }
        Err(e) => {
            warn!(error = %e, %actor_id, source = %pending.source, "image placement failed");
            state.host.notify(actor_id, &format!("Can't place that here: {e}"));
        }
    }
    true
}

/// Cell that must support the tile at `(col, row)`: `col` lateral steps from
/// the anchor and `row` cells straight down.
#[allow(clippy::cast_possible_wrap)]
fn support_cell(anchor: Cell, step: (i32, i32), col: u32, row: u32) -> Cell {
    let (step_x, step_z) = step;
    anchor.offset(col as i32 * step_x, -(row as i32), col as i32 * step_z)
}

#[cfg(test)]
#[path = "placement_test.rs"]
mod tests;
