use std::sync::Arc;

use super::*;
use crate::host::{Cell, Facing};
use crate::services::placement;
use crate::state::PendingPlacement;
use crate::state::test_helpers::{MockHost, test_env, write_test_image};

async fn registry_tuples(state: &AppState) -> Vec<(SurfaceId, String, u32, u32, bool)> {
    let registry = state.registry.read().await;
    let mut tuples: Vec<_> = registry
        .iter()
        .map(|(id, m)| (id, m.source.clone(), m.offset_x, m.offset_y, m.fast_send))
        .collect();
    tuples.sort();
    tuples
}

#[tokio::test]
async fn snapshot_round_trips_into_a_fresh_registry() {
    let env = test_env("persist_round_trip");
    write_test_image(&env.state.config.images_dir, "logo.png", 300, 130, [9, 9, 9, 255]);

    let pending = PendingPlacement { source: "logo.png".into(), fast_send: true };
    placement::place(&env.state, Cell::new(0, 64, 0), Facing::East, &pending)
        .await
        .unwrap();
    save(&env.state).await.unwrap();

    // Fresh state against the same workspace: same images, same snapshot.
    let host = MockHost::solid();
    let state = AppState::new(host.clone(), (*env.state.config).clone());
    let restored = load(&state).await.unwrap();
    assert_eq!(restored, 6);

    assert_eq!(registry_tuples(&env.state).await, registry_tuples(&state).await);

    // Fast-send entries were queued and renderers rebound on load.
    assert_eq!(state.send_queue.len(), 6);
    assert_eq!(host.bound_renderers.lock().unwrap().len(), 6);
    assert_eq!(host.cleared_renderers.lock().unwrap().len(), 6);
}

#[tokio::test]
async fn stale_entries_are_dropped_on_load_and_next_save() {
    let env = test_env("persist_stale");
    write_test_image(&env.state.config.images_dir, "present.png", 64, 64, [1, 1, 1, 255]);

    let snapshot = "3:\n  image: present.png\n  x: 0\n  y: 0\n  fastsend: true\n\
                    7:\n  image: ghost.png\n  x: 128\n  y: 0\n";
    std::fs::write(&env.state.config.snapshot_path, snapshot).unwrap();

    let restored = load(&env.state).await.unwrap();
    assert_eq!(restored, 1);

    let registry = env.state.registry.read().await;
    assert!(registry.get(3).is_some());
    assert!(registry.get(7).is_none());
    drop(registry);
    assert_eq!(env.state.send_queue.drain(8), vec![3]);

    // The dropped entry must not resurrect through the next save.
    save(&env.state).await.unwrap();
    let raw = std::fs::read_to_string(&env.state.config.snapshot_path).unwrap();
    assert!(raw.contains("present.png"));
    assert!(!raw.contains("ghost.png"));
}

#[tokio::test]
async fn missing_snapshot_restores_nothing() {
    let env = test_env("persist_absent");
    assert_eq!(load(&env.state).await.unwrap(), 0);
    assert!(env.state.registry.read().await.is_empty());
}

#[tokio::test]
async fn corrupt_snapshot_is_an_error_not_a_panic() {
    let env = test_env("persist_corrupt");
    std::fs::write(&env.state.config.snapshot_path, ":[ this is not yaml {{{").unwrap();
    assert!(matches!(load(&env.state).await.unwrap_err(), PersistError::Yaml(_)));
}

#[tokio::test]
async fn failed_save_leaves_memory_authoritative() {
    let env = test_env("persist_save_fail");
    write_test_image(&env.state.config.images_dir, "logo.png", 64, 64, [1, 1, 1, 255]);

    let pending = PendingPlacement { source: "logo.png".into(), fast_send: false };
    placement::place(&env.state, Cell::new(0, 64, 0), Facing::East, &pending)
        .await
        .unwrap();

    let mut config = (*env.state.config).clone();
    config.snapshot_path = env.dir.join("no_such_dir").join("maps.yml");
    let broken = AppState {
        config: Arc::new(config),
        ..env.state.clone()
    };

    assert!(matches!(save(&broken).await.unwrap_err(), PersistError::Io(_)));
    assert_eq!(broken.registry.read().await.len(), 1);
}

#[tokio::test]
async fn save_rewrites_removed_surfaces_away() {
    let env = test_env("persist_rewrite");
    write_test_image(&env.state.config.images_dir, "logo.png", 300, 64, [1, 1, 1, 255]);

    let pending = PendingPlacement { source: "logo.png".into(), fast_send: false };
    placement::place(&env.state, Cell::new(0, 64, 0), Facing::East, &pending)
        .await
        .unwrap();
    save(&env.state).await.unwrap();

    let dropped = {
        let mut registry = env.state.registry.write().await;
        let id = registry.iter().map(|(id, _)| id).min().unwrap();
        registry.remove(id);
        id
    };
    save(&env.state).await.unwrap();

    let raw = std::fs::read_to_string(&env.state.config.snapshot_path).unwrap();
    let parsed: std::collections::BTreeMap<SurfaceId, ImageMap> = serde_yaml::from_str(&raw).unwrap();
    assert_eq!(parsed.len(), 2);
    assert!(!parsed.contains_key(&dropped));
}
