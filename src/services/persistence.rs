//! Snapshot persistence — full YAML dump of the surface registry.
//!
//! DESIGN
//! ======
//! Every save rewrites the whole snapshot (stale keys disappear with it), so
//! the file always mirrors the in-memory registry at the moment of the save.
//! The write goes through a sibling temp file and a rename, so a crash
//! mid-write cannot leave a half-written snapshot behind.
//!
//! ERROR HANDLING
//! ==============
//! A failed save is logged severe and changes nothing in memory — the
//! registry stays authoritative until the next successful save. On load, an
//! entry whose image no longer decodes is dropped with a warning; it must
//! not resurrect a broken surface nor survive to the next save.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::host::SurfaceId;
use crate::services::cache;
use crate::state::{AppState, ImageMap};

/// On-disk snapshot document: one record per display surface id.
type Snapshot = BTreeMap<SurfaceId, ImageMap>;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// =============================================================================
// SAVE
// =============================================================================

/// Write the full registry snapshot to the configured path.
///
/// # Errors
///
/// `Io` or `Yaml` when the snapshot cannot be written; in-memory state is
/// untouched either way.
pub async fn save(state: &AppState) -> Result<(), PersistError> {
    let snapshot: Snapshot = {
        let registry = state.registry.read().await;
        registry.iter().map(|(id, map)| (id, map.clone())).collect()
    };

    let yaml = serde_yaml::to_string(&snapshot)?;
    let path = &state.config.snapshot_path;
    let tmp = path.with_extension("yml.tmp");
    tokio::fs::write(&tmp, yaml).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(surfaces = snapshot.len(), path = %path.display(), "surface snapshot saved");
    Ok(())
}

// =============================================================================
// LOAD
// =============================================================================

/// Restore the registry from the snapshot file, rebinding a renderer for
/// every surviving entry and queueing fast-send surfaces. A missing snapshot
/// file restores nothing. Returns the number of restored surfaces.
///
/// # Errors
///
/// `Io` or `Yaml` when the snapshot exists but cannot be read or parsed.
pub async fn load(state: &AppState) -> Result<usize, PersistError> {
    let path = &state.config.snapshot_path;
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no surface snapshot to load");
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };
    let snapshot: Snapshot = serde_yaml::from_str(&raw)?;

    let mut restored = 0;
    for (id, map) in snapshot {
        // EDGE: images that vanished from disk drop their surfaces here and,
        // because saves are full rewrites, from the next snapshot too.
        let image = match cache::get(state, &map.source).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, image = %map.source, surface = id, "image not loadable, dropping persisted surface");
                continue;
            }
        };

        state.host.clear_renderers(id);
        state.host.bind_renderer(id, &image, map.offset_x, map.offset_y);
        if map.fast_send {
            state.send_queue.enqueue(id);
        }
        state.registry.write().await.insert(id, map);
        restored += 1;
    }

    info!(restored, path = %path.display(), "surface snapshot loaded");
    Ok(restored)
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
