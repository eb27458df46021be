//! Tile cache — decoded image buffers keyed by source.
//!
//! DESIGN
//! ======
//! Sources resolve local-first: a file under the configured images dir wins,
//! otherwise URL-shaped sources are fetched remotely with a bounded timeout.
//! Buffers are cached only on successful decode and live until an explicit
//! reload invalidates them; the image set is small and operator-controlled.
//!
//! ERROR HANDLING
//! ==============
//! Decode and fetch failures are reportable errors, never fatal. Callers
//! treat any `CacheError` as "cannot place/reload this source" and tell the
//! actor, not the process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::config::Config;
use crate::state::AppState;
use crate::tile::DecodedImage;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to fetch remote image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("image has no pixels: {0}")]
    EmptyImage(String),
}

/// Decoded-image cache plus the HTTP client used for remote sources.
#[derive(Clone)]
pub struct ImageCache {
    entries: Arc<RwLock<HashMap<String, Arc<DecodedImage>>>>,
    client: reqwest::Client,
}

impl ImageCache {
    #[must_use]
    pub(crate) fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .unwrap_or_default();
        Self { entries: Arc::new(RwLock::new(HashMap::new())), client }
    }

    /// Drop the cached buffer for a source, forcing the next `get` to decode.
    pub async fn invalidate(&self, source: &str) {
        self.entries.write().await.remove(source);
    }

    async fn lookup(&self, source: &str) -> Option<Arc<DecodedImage>> {
        self.entries.read().await.get(source).cloned()
    }

    async fn store(&self, source: &str, image: Arc<DecodedImage>) {
        self.entries.write().await.insert(source.to_owned(), image);
    }
}

// =============================================================================
// LOOKUP
// =============================================================================

/// Resolve a source to its decoded pixel buffer, decoding on first use.
///
/// # Errors
///
/// `NotFound` when the source is neither a local file nor a URL; `Io`,
/// `Decode`, or `Fetch` when resolution fails; `EmptyImage` when the decoded
/// image has a zero dimension.
pub async fn get(state: &AppState, source: &str) -> Result<Arc<DecodedImage>, CacheError> {
    if let Some(image) = state.images.lookup(source).await {
        return Ok(image);
    }

    let path = state.config.images_dir.join(source);
    let image = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        decode_file(source, &path).await?
    } else if is_remote(source) {
        fetch_remote(&state.images.client, source).await?
    } else {
        return Err(CacheError::NotFound(source.to_owned()));
    };

    let image = Arc::new(image);
    state.images.store(source, image.clone()).await;
    Ok(image)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn decode_file(source: &str, path: &Path) -> Result<DecodedImage, CacheError> {
    let bytes = tokio::fs::read(path).await?;
    debug!(source, bytes = bytes.len(), "decoding local image");
    decode_bytes(source, &bytes)
}

async fn fetch_remote(client: &reqwest::Client, source: &str) -> Result<DecodedImage, CacheError> {
    let bytes = client
        .get(source)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    debug!(source, bytes = bytes.len(), "decoding fetched image");
    decode_bytes(source, &bytes)
}

fn decode_bytes(source: &str, bytes: &[u8]) -> Result<DecodedImage, CacheError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CacheError::EmptyImage(source.to_owned()));
    }
    Ok(DecodedImage { width, height, pixels: Arc::new(rgba.into_raw()) })
}
