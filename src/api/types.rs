use serde::{Deserialize, Serialize};

/// Geographic coordinate as `[lon, lat]`, matching the backend wire order.
pub type LonLat = [f64; 2];

/// One waypoint or geometry point of a non-segmented route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub coord: LonLat,
}

/// A labeled sub-path of a multi-modal route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub coords: Vec<LonLat>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// How a single-path route should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Pedestrian,
    /// Any non-pedestrian route type; drawn as a vehicle route.
    #[serde(other)]
    Other,
}

/// Backend response to a route request.
///
/// The wire format distinguishes the shapes by field presence; that
/// sniffing happens exactly once here, at the serde boundary. Everything
/// downstream matches on the variant. When a response carries the fields of
/// both shapes, single-path wins (the segmented shape is the older wire
/// format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoutePayload {
    /// Backend-side failure, or a locally synthesized one on upload errors.
    Error { error: String },

    /// A single route, drawn whole: waypoints for the directions helper
    /// plus optional precomputed geometry.
    SinglePath {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
        route_type: RouteType,
        /// Full route geometry; may be absent when only waypoints are known.
        #[serde(default)]
        route: Vec<RoutePoint>,
        pivot_route_points: Vec<RoutePoint>,
    },

    /// A route split into labeled, individually colored segments.
    Segmented {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transcript: Option<String>,
        route: Vec<RouteSegment>,
    },
}

impl RoutePayload {
    /// Synthesize a local error payload, routed through the same rendering
    /// path as backend responses.
    pub fn error(message: impl Into<String>) -> Self {
        RoutePayload::Error {
            error: message.into(),
        }
    }

    pub fn transcript(&self) -> Option<&str> {
        match self {
            RoutePayload::SinglePath { transcript, .. }
            | RoutePayload::Segmented { transcript, .. } => transcript.as_deref(),
            RoutePayload::Error { .. } => None,
        }
    }

    /// First coordinate of the route, used to center a freshly mounted map.
    pub fn first_point(&self) -> Option<LonLat> {
        match self {
            RoutePayload::SinglePath {
                route,
                pivot_route_points,
                ..
            } => route
                .first()
                .or_else(|| pivot_route_points.first())
                .map(|p| p.coord),
            RoutePayload::Segmented { route, .. } => {
                route.first().and_then(|s| s.coords.first()).copied()
            }
            RoutePayload::Error { .. } => None,
        }
    }
}

/// Body of the one-shot user position report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub lat: f64,
    pub lon: f64,
}
