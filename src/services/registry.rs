//! Surface registry — content-addressed display surface records.
//!
//! DESIGN
//! ======
//! Every display surface this system owns is recorded as an [`ImageMap`]. A
//! hash index keyed by `(source, offset_x, offset_y)` gives O(1) content
//! lookup, so independent placements of the identical tile reuse one surface
//! instead of allocating another.
//!
//! The registry is the sole source of persisted truth; the image cache and
//! the fast-send queue hold only derived state that can be rebuilt from it.

use std::collections::HashMap;

use crate::host::{SurfaceHost, SurfaceId};
use crate::state::ImageMap;
use crate::tile::DecodedImage;

type ContentKey = (String, u32, u32);

#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    entries: HashMap<SurfaceId, ImageMap>,
    by_content: HashMap<ContentKey, SurfaceId>,
}

impl SurfaceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface already rendering this exact tile, if any.
    #[must_use]
    pub fn find_by_content(&self, source: &str, offset_x: u32, offset_y: u32) -> Option<SurfaceId> {
        self.by_content.get(&(source.to_owned(), offset_x, offset_y)).copied()
    }

    /// Return the surface rendering this tile, allocating and binding a fresh
    /// one if no surface renders it yet.
    ///
    /// Any pre-existing renderers on a fresh surface are cleared before the
    /// tile renderer is bound, so a surface never carries more than one. A
    /// fast-send placement upgrades an existing surface's flag; the flag is
    /// never downgraded here.
    pub fn get_or_create_surface(
        &mut self,
        host: &dyn SurfaceHost,
        source: &str,
        offset_x: u32,
        offset_y: u32,
        image: &DecodedImage,
        fast_send: bool,
    ) -> SurfaceId {
        if let Some(id) = self.find_by_content(source, offset_x, offset_y) {
            if fast_send && let Some(entry) = self.entries.get_mut(&id) {
                entry.fast_send = true;
            }
            return id;
        }

        let id = host.allocate_surface();
        host.clear_renderers(id);
        host.bind_renderer(id, image, offset_x, offset_y);
        self.insert(id, ImageMap { source: source.to_owned(), offset_x, offset_y, fast_send });
        id
    }

    /// Register a record, replacing any previous record for the id and
    /// keeping the content index consistent.
    pub fn insert(&mut self, id: SurfaceId, map: ImageMap) {
        if let Some(old) = self.entries.remove(&id)
            && self.by_content.get(&content_key(&old)) == Some(&id)
        {
            self.by_content.remove(&content_key(&old));
        }
        self.by_content.insert(content_key(&map), id);
        self.entries.insert(id, map);
    }

    #[must_use]
    pub fn get(&self, id: SurfaceId) -> Option<&ImageMap> {
        self.entries.get(&id)
    }

    pub fn remove(&mut self, id: SurfaceId) -> Option<ImageMap> {
        let map = self.entries.remove(&id)?;
        if self.by_content.get(&content_key(&map)) == Some(&id) {
            self.by_content.remove(&content_key(&map));
        }
        Some(map)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &ImageMap)> {
        self.entries.iter().map(|(id, map)| (*id, map))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn content_key(map: &ImageMap) -> ContentKey {
    (map.source.clone(), map.offset_x, map.offset_y)
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
