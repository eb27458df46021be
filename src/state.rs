//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is the handle every service receives. It owns the surface
//! registry (the sole persisted truth), the pending-placement table, the
//! decoded-image cache, and the fast-send queue. All inner fields are
//! Arc-wrapped so the state can be cloned into background tasks.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::host::SurfaceHost;
use crate::services::cache::ImageCache;
use crate::services::fastsend::SendQueue;
use crate::services::registry::SurfaceRegistry;

// =============================================================================
// IMAGE MAP
// =============================================================================

/// One tile of one image placement. Mirrors a record of the snapshot file.
///
/// `offset_x`/`offset_y` are pixel offsets into the source image, always
/// multiples of the tile width/height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMap {
    #[serde(rename = "image")]
    pub source: String,
    #[serde(rename = "x")]
    pub offset_x: u32,
    #[serde(rename = "y")]
    pub offset_y: u32,
    #[serde(rename = "fastsend", default)]
    pub fast_send: bool,
}

// =============================================================================
// PENDING PLACEMENT
// =============================================================================

/// Ephemeral intent recorded between a start-placement request and the
/// actor's next trigger interaction. Keyed by actor id in `AppState::pending`;
/// consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlacement {
    pub source: String,
    pub fast_send: bool,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared state handle, cloned into every service call and background task.
#[derive(Clone)]
pub struct AppState {
    /// World-facing collaborator supplied by the host environment.
    pub host: Arc<dyn SurfaceHost>,
    pub config: Arc<Config>,
    /// Display surfaces owned by this system. Sole source of persisted truth.
    pub registry: Arc<RwLock<SurfaceRegistry>>,
    /// Placement intents awaiting the owning actor's trigger interaction.
    pub pending: Arc<RwLock<HashMap<Uuid, PendingPlacement>>>,
    /// Decoded image buffers keyed by source.
    pub images: ImageCache,
    /// Surface ids awaiting the next fast-send batch.
    pub send_queue: SendQueue,
}

impl AppState {
    #[must_use]
    pub fn new(host: Arc<dyn SurfaceHost>, config: Config) -> Self {
        let images = ImageCache::new(&config);
        let send_queue = SendQueue::new(config.queue_limit);
        Self {
            host,
            config: Arc::new(config),
            registry: Arc::new(RwLock::new(SurfaceRegistry::new())),
            pending: Arc::new(RwLock::new(HashMap::new())),
            images,
            send_queue,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use super::test_helpers::test_env;

    #[tokio::test]
    async fn fresh_state_is_empty() {
        let env = test_env("fresh_state");
        assert!(env.state.registry.read().await.is_empty());
        assert!(env.state.pending.read().await.is_empty());
        assert!(env.state.send_queue.is_empty());
    }

    #[test]
    fn image_map_uses_snapshot_field_names() {
        let map = ImageMap { source: "logo.png".into(), offset_x: 128, offset_y: 256, fast_send: true };
        let yaml = serde_yaml::to_string(&map).unwrap();
        assert!(yaml.contains("image: logo.png"));
        assert!(yaml.contains("x: 128"));
        assert!(yaml.contains("y: 256"));
        assert!(yaml.contains("fastsend: true"));
    }

    #[test]
    fn image_map_fastsend_defaults_false() {
        let map: ImageMap = serde_yaml::from_str("image: logo.png\nx: 0\ny: 0\n").unwrap();
        assert!(!map.fast_send);
        assert_eq!(map.offset_x, 0);
    }
}
