use std::sync::Arc;

use thiserror::Error;

use crate::api::LonLat;

#[derive(Debug, Error)]
pub enum MapError {
    /// The underlying engine rejected an operation.
    #[error("Map engine error: {reason}")]
    EngineError { reason: String },
}

/// Options for creating a map instance
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Initial center, `[lon, lat]`
    pub center: LonLat,
    /// Initial zoom level
    pub zoom: u8,
    /// Engine API key
    pub key: String,
}

/// A line overlay across an ordered coordinate sequence, with a casing
/// stroke drawn underneath the main stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineSpec {
    pub coordinates: Vec<LonLat>,
    pub width: f32,
    pub color: String,
    pub width2: f32,
    pub color2: String,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleMarkerSpec {
    pub coordinates: LonLat,
    pub radius: f32,
    pub color: String,
    pub stroke_width: f32,
    pub stroke_color: String,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelSpec {
    pub coordinates: LonLat,
    pub text: String,
    pub font_size: f32,
    pub color: String,
    pub z_index: i32,
}

/// Geographic bounding box, south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south_west: LonLat,
    pub north_east: LonLat,
}

impl GeoBounds {
    /// Min/max reduction over a coordinate sequence, seeded with infinity.
    /// `None` for an empty sequence.
    pub fn enclosing(coords: &[LonLat]) -> Option<GeoBounds> {
        if coords.is_empty() {
            return None;
        }
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        for coord in coords {
            for axis in 0..2 {
                min[axis] = min[axis].min(coord[axis]);
                max[axis] = max[axis].max(coord[axis]);
            }
        }
        Some(GeoBounds {
            south_west: min,
            north_east: max,
        })
    }
}

/// The kind of primitive an overlay object is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Polyline,
    CircleMarker,
    Label,
}

/// A visual primitive drawn on the map.
///
/// Owned exclusively by the route renderer and destroyed explicitly before
/// a superseding overlay set is created or the map is torn down.
pub trait Overlay: Send + Sync {
    fn kind(&self) -> OverlayKind;

    /// Remove the primitive from the map and release engine resources.
    fn destroy(self: Box<Self>);
}

/// Line style for directions-rendered routes.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStyle {
    pub route_line_width: f32,
}

/// Turn-by-turn directions helper bound to one map instance.
///
/// The helper owns its internal overlay lifecycle; consumers clear it in
/// bulk rather than destroying objects one by one.
pub trait Directions: Send + Sync {
    /// Remove every overlay the helper has drawn.
    fn clear(&mut self);

    /// Draw a pedestrian route through the given waypoints.
    fn pedestrian_route(&mut self, points: &[LonLat], style: &RouteStyle) -> Result<(), MapError>;

    /// Draw a vehicle route through the given waypoints.
    fn car_route(&mut self, points: &[LonLat], style: &RouteStyle) -> Result<(), MapError>;
}

/// A live map created by a `MapEngine`
///
/// Overlay factory plus viewport control. Shared read-only with the route
/// renderer; only the surface manager creates or destroys instances.
pub trait MapInstance: Send + Sync {
    fn add_polyline(&self, spec: &PolylineSpec) -> Result<Box<dyn Overlay>, MapError>;

    fn add_circle_marker(&self, spec: &CircleMarkerSpec) -> Result<Box<dyn Overlay>, MapError>;

    fn add_label(&self, spec: &LabelSpec) -> Result<Box<dyn Overlay>, MapError>;

    /// Fit the viewport to the given bounds with a pixel padding margin.
    fn fit_bounds(&self, bounds: GeoBounds, padding: u32);

    /// Construct a directions helper for this map, or `None` when the
    /// engine has no directions support.
    fn directions(&self, api_key: &str) -> Option<Box<dyn Directions>>;

    /// Tear down the underlying engine object. The surface manager is the
    /// only caller.
    fn destroy(&self);
}

/// Map engine trait
///
/// Asynchronous module load plus map construction, the way embeddable map
/// engines expose themselves.
#[async_trait::async_trait]
pub trait MapEngine: Send + Sync {
    /// Load the engine (if needed) and create a map instance.
    async fn create_map(&self, options: MapOptions) -> Result<Arc<dyn MapInstance>, MapError>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}
