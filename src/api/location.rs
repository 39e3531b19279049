use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use super::client::RouteApiClient;
use super::types::UserLocation;

#[derive(Debug, Error)]
pub enum LocationError {
    /// Location access denied by the user or the OS.
    #[error("Location access denied: {reason}")]
    PermissionDenied { reason: String },

    /// No position could be determined.
    #[error("Location unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A device position, in the lat/lon order the location report uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
}

/// One-shot position source
///
/// Stands in for a platform geolocation service; implementations answer a
/// single query, there is no subscription or retry.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Query the current position once
    async fn current_position(&self) -> Result<GeoPosition, LocationError>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Fixed position from configuration.
pub struct StaticLocationProvider {
    position: Option<GeoPosition>,
}

impl StaticLocationProvider {
    pub fn new(position: Option<GeoPosition>) -> Self {
        Self { position }
    }
}

#[async_trait::async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn current_position(&self) -> Result<GeoPosition, LocationError> {
        self.position.ok_or_else(|| LocationError::Unavailable {
            reason: "no position configured".to_string(),
        })
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Query the provider once and forward the position to the backend.
///
/// Fire-and-forget: failures only update the status line, the application
/// carries on without a stored location.
pub async fn report_user_location(
    provider: &dyn LocationProvider,
    client: &RouteApiClient,
    status_tx: &watch::Sender<String>,
) {
    let _ = status_tx.send("Requesting location...".to_string());

    let position = match provider.current_position().await {
        Ok(position) => position,
        Err(e) => {
            warn!("Geolocation failed ({}): {}", provider.name(), e);
            let _ = status_tx.send("Could not determine your location.".to_string());
            return;
        }
    };

    let location = UserLocation {
        lat: position.lat,
        lon: position.lon,
    };

    match client.report_location(&location).await {
        Ok(()) => {
            info!("User location reported: {}, {}", location.lat, location.lon);
            let _ = status_tx.send("Location saved. Tap to record.".to_string());
        }
        Err(e) => {
            warn!("Failed to send location: {}", e);
            let _ = status_tx.send("Failed to send your location.".to_string());
        }
    }
}
