//! Backend API client
//!
//! Wire types and HTTP client for the STT/route-planning service:
//! - POST /api/stt-route (and the tourist variant) - multipart audio upload
//! - POST /api/user-location - one-shot position report

pub mod client;
pub mod location;
pub mod types;

pub use client::{ApiError, RouteApiClient, RouteMode};
pub use location::{
    report_user_location, GeoPosition, LocationError, LocationProvider, StaticLocationProvider,
};
pub use types::{LonLat, RoutePayload, RoutePoint, RouteSegment, RouteType, UserLocation};
