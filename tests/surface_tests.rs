// Unit tests for map surface mount/unmount lifecycle
//
// The race case matters most: an engine init that resolves after unmount
// must destroy the instance it produced instead of leaking it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use voice_route::config::MapConfig;
use voice_route::{
    HeadlessMapEngine, MapEngine, MapError, MapInstance, MapOp, MapOptions, MapSurface,
    RoutePayload, RoutePoint, RouteType,
};

fn options() -> MapOptions {
    MapOptions {
        center: [37.6175, 55.7504],
        zoom: 11,
        key: "test-key".to_string(),
    }
}

fn map_config() -> MapConfig {
    MapConfig {
        center: [37.6175, 55.7504],
        zoom: 11,
        route_zoom: 13,
        api_key: "test-key".to_string(),
    }
}

/// Engine whose init blocks until the test releases it.
struct GatedEngine {
    inner: Arc<HeadlessMapEngine>,
    gate: Arc<Notify>,
}

#[async_trait::async_trait]
impl MapEngine for GatedEngine {
    async fn create_map(&self, options: MapOptions) -> Result<Arc<dyn MapInstance>, MapError> {
        self.gate.notified().await;
        self.inner.create_map(options).await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within one second");
}

#[tokio::test]
async fn test_mount_publishes_handle() {
    let engine = Arc::new(HeadlessMapEngine::new());
    let surface = MapSurface::new(engine.clone());
    let mut rx = surface.subscribe();

    assert!(surface.handle().is_none(), "no handle before init completes");

    surface.mount(options());
    rx.changed().await.expect("handle should be published");

    assert!(rx.borrow().is_some());
    assert!(surface.handle().is_some());
    assert!(engine
        .ops()
        .iter()
        .any(|op| matches!(op, MapOp::MapCreated { .. })));
}

#[tokio::test]
async fn test_unmount_destroys_instance_and_clears_handle() {
    let engine = Arc::new(HeadlessMapEngine::new());
    let surface = MapSurface::new(engine.clone());
    let mut rx = surface.subscribe();

    surface.mount(options());
    rx.changed().await.expect("handle should be published");

    surface.unmount();

    assert!(surface.handle().is_none());
    assert!(rx.borrow().is_none());
    assert!(engine.ops().contains(&MapOp::MapDestroyed));
}

#[tokio::test]
async fn test_mount_initializes_exactly_once() {
    let engine = Arc::new(HeadlessMapEngine::new());
    let surface = MapSurface::new(engine.clone());
    let mut rx = surface.subscribe();

    surface.mount(options());
    surface.mount(options());
    rx.changed().await.expect("handle should be published");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let creations = engine
        .ops()
        .iter()
        .filter(|op| matches!(op, MapOp::MapCreated { .. }))
        .count();
    assert_eq!(creations, 1);
}

#[tokio::test]
async fn test_unmount_during_init_destroys_late_instance() {
    let inner = Arc::new(HeadlessMapEngine::new());
    let gate = Arc::new(Notify::new());
    let surface = MapSurface::new(Arc::new(GatedEngine {
        inner: inner.clone(),
        gate: gate.clone(),
    }));

    surface.mount(options());
    // Tear down while the engine is still loading.
    surface.unmount();
    gate.notify_one();

    let ops_engine = inner.clone();
    wait_for(move || ops_engine.ops().contains(&MapOp::MapDestroyed)).await;

    assert!(surface.handle().is_none(), "a late instance is never published");
    let ops = inner.ops();
    assert!(ops.iter().any(|op| matches!(op, MapOp::MapCreated { .. })));
    assert!(ops.contains(&MapOp::MapDestroyed));
}

#[test]
fn test_initial_options_use_defaults_without_a_route() {
    let opts = MapSurface::initial_options(&map_config(), None);

    assert_eq!(opts.center, [37.6175, 55.7504]);
    assert_eq!(opts.zoom, 11);
}

#[test]
fn test_initial_options_center_on_known_route() {
    let payload = RoutePayload::SinglePath {
        transcript: None,
        route_type: RouteType::Pedestrian,
        route: vec![RoutePoint {
            coord: [30.3, 59.9],
        }],
        pivot_route_points: vec![RoutePoint {
            coord: [30.4, 59.8],
        }],
    };

    let opts = MapSurface::initial_options(&map_config(), Some(&payload));

    assert_eq!(opts.center, [30.3, 59.9]);
    assert_eq!(opts.zoom, 13);
}
