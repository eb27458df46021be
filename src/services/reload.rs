//! Reload — refresh every placed tile of a source in place.
//!
//! DESIGN
//! ======
//! Reload updates, it never recreates: surface ids and frame placements stay
//! exactly as they are, only the renderer input is rebound to the freshly
//! decoded bitmap. Every affected surface is queued for distribution so
//! viewers pick up the new content without touching a frame.

use tracing::info;

use crate::host::SurfaceId;
use crate::services::cache;
use crate::services::cache::CacheError;
use crate::state::AppState;

/// Re-decode a source and rebind the renderer of every tile placed from it.
/// Returns the number of refreshed tiles.
///
/// # Errors
///
/// Any `CacheError` from the re-decode. Existing tiles keep their last-good
/// rendering in that case — the stale cache entry is dropped, but no renderer
/// is touched.
pub async fn reload(state: &AppState, source: &str) -> Result<usize, CacheError> {
    state.images.invalidate(source).await;
    let image = cache::get(state, source).await?;

    let affected: Vec<(SurfaceId, u32, u32)> = {
        let registry = state.registry.read().await;
        registry
            .iter()
            .filter(|(_, map)| map.source == source)
            .map(|(id, map)| (id, map.offset_x, map.offset_y))
            .collect()
    };

    for &(id, offset_x, offset_y) in &affected {
        state.host.clear_renderers(id);
        state.host.bind_renderer(id, &image, offset_x, offset_y);
        state.send_queue.enqueue(id);
    }

    info!(source, tiles = affected.len(), "image reloaded");
    Ok(affected.len())
}

#[cfg(test)]
#[path = "reload_test.rs"]
mod tests;
