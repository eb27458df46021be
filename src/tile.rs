//! Tile constants, grid math, and decoded pixel buffers.
//!
//! DESIGN
//! ======
//! A tile is the fixed 128×128 unit the display surface hardware renders;
//! images are cut into a grid of them, rounding partial tiles up so edge
//! tiles carry a partially filled bitmap rather than being dropped.

use std::sync::Arc;

/// Width in pixels of one display surface.
pub const TILE_WIDTH: u32 = 128;

/// Height in pixels of one display surface.
pub const TILE_HEIGHT: u32 = 128;

/// A decoded raster image in row-major RGBA8 form, shared between the cache,
/// the registry, and the host's renderers.
#[derive(Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<Vec<u8>>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Grid dimensions `(columns, rows)` covering an image, partial tiles rounded up.
#[must_use]
pub fn grid_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(TILE_WIDTH), height.div_ceil(TILE_HEIGHT))
}
