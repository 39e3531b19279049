pub mod api;
pub mod app;
pub mod audio;
pub mod config;
pub mod map;
pub mod session;

pub use api::{
    ApiError, GeoPosition, LocationError, LocationProvider, LonLat, RouteApiClient, RouteMode,
    RoutePayload, RoutePoint, RouteSegment, RouteType, StaticLocationProvider, UserLocation,
};
pub use app::{spawn_render_task, VoiceRouteApp};
pub use audio::{
    AudioChunk, CaptureBackend, CaptureBackendFactory, CaptureConfig, CaptureError, CaptureSource,
    Codec,
};
pub use config::Config;
pub use map::{
    GeoBounds, HeadlessMapEngine, MapEngine, MapError, MapInstance, MapOp, MapOptions, MapSurface,
    RenderStyle, RouteRenderer,
};
pub use session::{AudioArtifact, RecordingController, RecordingState, SessionStats};
