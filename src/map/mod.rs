//! Map surface and route rendering
//!
//! The map engine is an external collaborator behind the `MapEngine` /
//! `MapInstance` traits. `MapSurface` owns instance lifetime and publishes
//! the handle; `RouteRenderer` owns every overlay it draws.

pub mod engine;
pub mod headless;
pub mod render;
pub mod surface;

pub use engine::{
    CircleMarkerSpec, Directions, GeoBounds, LabelSpec, MapEngine, MapError, MapInstance,
    MapOptions, Overlay, OverlayKind, PolylineSpec, RouteStyle,
};
pub use headless::{HeadlessMapEngine, MapOp};
pub use render::{RenderStyle, RouteRenderer};
pub use surface::MapSurface;
