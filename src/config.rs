//! Runtime configuration for the tile placement and distribution core.
//!
//! DESIGN
//! ======
//! Compiled defaults overridable per-knob via environment variables. The
//! fetch timeout and queue limit bound the two resources the distribution
//! design otherwise leaves open: a hanging remote fetch and an unbounded
//! pending set.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_IMAGES_DIR: &str = "images";
const DEFAULT_SNAPSHOT_PATH: &str = "maps.yml";
const DEFAULT_SEND_PERIOD_MS: u64 = 1000;
const DEFAULT_SEND_BATCH: usize = 8;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_QUEUE_LIMIT: usize = 4096;

/// Tuning knobs for placement, persistence, and the fast-send worker.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory searched for local image sources.
    pub images_dir: PathBuf,
    /// Path of the persisted surface snapshot.
    pub snapshot_path: PathBuf,
    /// Interval between fast-send batches.
    pub send_period: Duration,
    /// Maximum surface ids dispatched per fast-send batch.
    pub send_batch: usize,
    /// Upper bound on a single remote image fetch.
    pub fetch_timeout: Duration,
    /// Maximum ids held in the fast-send pending set.
    pub queue_limit: usize,
}

impl Config {
    /// Build a config from environment variables, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            images_dir: PathBuf::from(env_string("TILECAST_IMAGES_DIR", DEFAULT_IMAGES_DIR)),
            snapshot_path: PathBuf::from(env_string("TILECAST_SNAPSHOT_PATH", DEFAULT_SNAPSHOT_PATH)),
            send_period: Duration::from_millis(env_parse("TILECAST_SEND_PERIOD_MS", DEFAULT_SEND_PERIOD_MS)),
            send_batch: env_parse("TILECAST_SEND_BATCH", DEFAULT_SEND_BATCH),
            fetch_timeout: Duration::from_millis(env_parse("TILECAST_FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)),
            queue_limit: env_parse("TILECAST_QUEUE_LIMIT", DEFAULT_QUEUE_LIMIT),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            send_period: Duration::from_millis(DEFAULT_SEND_PERIOD_MS),
            send_batch: DEFAULT_SEND_BATCH,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            queue_limit: DEFAULT_QUEUE_LIMIT,
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_compiled_constants() {
        let cfg = Config::default();
        assert_eq!(cfg.send_period, Duration::from_millis(1000));
        assert_eq!(cfg.send_batch, 8);
        assert_eq!(cfg.images_dir, PathBuf::from("images"));
        assert_eq!(cfg.snapshot_path, PathBuf::from("maps.yml"));
        assert_eq!(cfg.queue_limit, 4096);
    }

    #[test]
    fn env_parse_falls_back_when_unset() {
        assert_eq!(env_parse("TILECAST_TEST_UNSET_KEY", 42u64), 42);
    }
}
