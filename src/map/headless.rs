use std::sync::{Arc, Mutex};

use tracing::debug;

use super::engine::{
    CircleMarkerSpec, Directions, GeoBounds, LabelSpec, MapError, MapEngine, MapInstance,
    MapOptions, Overlay, OverlayKind, PolylineSpec, RouteStyle,
};
use crate::api::LonLat;

/// Everything a headless map has been asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp {
    MapCreated {
        center: LonLat,
        zoom: u8,
    },
    PolylineCreated {
        coordinates: Vec<LonLat>,
        color: String,
        z_index: i32,
    },
    CircleMarkerCreated {
        coordinates: LonLat,
        z_index: i32,
    },
    LabelCreated {
        coordinates: LonLat,
        text: String,
        z_index: i32,
    },
    OverlayDestroyed(OverlayKind),
    FitBounds {
        bounds: GeoBounds,
        padding: u32,
    },
    DirectionsCleared,
    PedestrianRouteRequested {
        points: Vec<LonLat>,
    },
    CarRouteRequested {
        points: Vec<LonLat>,
    },
    MapDestroyed,
}

type OpLog = Arc<Mutex<Vec<MapOp>>>;

fn record(ops: &OpLog, op: MapOp) {
    debug!("map op: {:?}", op);
    match ops.lock() {
        Ok(mut ops) => ops.push(op),
        Err(poisoned) => poisoned.into_inner().push(op),
    }
}

/// Map engine that records operations instead of drawing
///
/// Backs the bundled binary (where the real engine lives in an embedding
/// layer) and the test suite.
pub struct HeadlessMapEngine {
    ops: OpLog,
    with_directions: bool,
}

impl HeadlessMapEngine {
    pub fn new() -> Self {
        Self {
            ops: Arc::new(Mutex::new(Vec::new())),
            with_directions: true,
        }
    }

    /// An engine without directions support, so single-path routes take
    /// the whole-route fallback branch.
    pub fn without_directions() -> Self {
        Self {
            ops: Arc::new(Mutex::new(Vec::new())),
            with_directions: false,
        }
    }

    /// Snapshot of the recorded operations.
    pub fn ops(&self) -> Vec<MapOp> {
        match self.ops.lock() {
            Ok(ops) => ops.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for HeadlessMapEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MapEngine for HeadlessMapEngine {
    async fn create_map(&self, options: MapOptions) -> Result<Arc<dyn MapInstance>, MapError> {
        record(
            &self.ops,
            MapOp::MapCreated {
                center: options.center,
                zoom: options.zoom,
            },
        );
        Ok(Arc::new(HeadlessMap {
            ops: Arc::clone(&self.ops),
            with_directions: self.with_directions,
        }))
    }

    fn name(&self) -> &str {
        "headless"
    }
}

struct HeadlessMap {
    ops: OpLog,
    with_directions: bool,
}

impl MapInstance for HeadlessMap {
    fn add_polyline(&self, spec: &PolylineSpec) -> Result<Box<dyn Overlay>, MapError> {
        record(
            &self.ops,
            MapOp::PolylineCreated {
                coordinates: spec.coordinates.clone(),
                color: spec.color.clone(),
                z_index: spec.z_index,
            },
        );
        Ok(Box::new(HeadlessOverlay {
            ops: Arc::clone(&self.ops),
            kind: OverlayKind::Polyline,
        }))
    }

    fn add_circle_marker(&self, spec: &CircleMarkerSpec) -> Result<Box<dyn Overlay>, MapError> {
        record(
            &self.ops,
            MapOp::CircleMarkerCreated {
                coordinates: spec.coordinates,
                z_index: spec.z_index,
            },
        );
        Ok(Box::new(HeadlessOverlay {
            ops: Arc::clone(&self.ops),
            kind: OverlayKind::CircleMarker,
        }))
    }

    fn add_label(&self, spec: &LabelSpec) -> Result<Box<dyn Overlay>, MapError> {
        record(
            &self.ops,
            MapOp::LabelCreated {
                coordinates: spec.coordinates,
                text: spec.text.clone(),
                z_index: spec.z_index,
            },
        );
        Ok(Box::new(HeadlessOverlay {
            ops: Arc::clone(&self.ops),
            kind: OverlayKind::Label,
        }))
    }

    fn fit_bounds(&self, bounds: GeoBounds, padding: u32) {
        record(&self.ops, MapOp::FitBounds { bounds, padding });
    }

    fn directions(&self, _api_key: &str) -> Option<Box<dyn Directions>> {
        if self.with_directions {
            Some(Box::new(HeadlessDirections {
                ops: Arc::clone(&self.ops),
            }))
        } else {
            None
        }
    }

    fn destroy(&self) {
        record(&self.ops, MapOp::MapDestroyed);
    }
}

struct HeadlessOverlay {
    ops: OpLog,
    kind: OverlayKind,
}

impl Overlay for HeadlessOverlay {
    fn kind(&self) -> OverlayKind {
        self.kind
    }

    fn destroy(self: Box<Self>) {
        record(&self.ops, MapOp::OverlayDestroyed(self.kind));
    }
}

struct HeadlessDirections {
    ops: OpLog,
}

impl Directions for HeadlessDirections {
    fn clear(&mut self) {
        record(&self.ops, MapOp::DirectionsCleared);
    }

    fn pedestrian_route(&mut self, points: &[LonLat], _style: &RouteStyle) -> Result<(), MapError> {
        record(
            &self.ops,
            MapOp::PedestrianRouteRequested {
                points: points.to_vec(),
            },
        );
        Ok(())
    }

    fn car_route(&mut self, points: &[LonLat], _style: &RouteStyle) -> Result<(), MapError> {
        record(
            &self.ops,
            MapOp::CarRouteRequested {
                points: points.to_vec(),
            },
        );
        Ok(())
    }
}
