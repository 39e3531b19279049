//! Application driver
//!
//! Wires the recording session, the upload client and the route renderer
//! together: one toggle mirrors the single mic button, and a background
//! task re-renders whenever the map handle or the route payload changes.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::api::{RouteApiClient, RouteMode, RoutePayload};
use crate::map::{MapInstance, RouteRenderer};
use crate::session::{RecordingController, RecordingState, SessionStats};

pub struct VoiceRouteApp {
    controller: RecordingController,
    client: RouteApiClient,
    mode: RouteMode,
    payload_tx: watch::Sender<Option<RoutePayload>>,
    status_tx: watch::Sender<String>,
}

impl VoiceRouteApp {
    pub fn new(
        controller: RecordingController,
        client: RouteApiClient,
        mode: RouteMode,
        status_tx: watch::Sender<String>,
    ) -> Self {
        let (payload_tx, _) = watch::channel(None);
        Self {
            controller,
            client,
            mode,
            payload_tx,
            status_tx,
        }
    }

    /// Subscribe to route payload publications. Exactly one response slot:
    /// successes and synthesized error payloads arrive the same way.
    pub fn payload_subscribe(&self) -> watch::Receiver<Option<RoutePayload>> {
        self.payload_tx.subscribe()
    }

    /// The latest published payload.
    pub fn payload(&self) -> Option<RoutePayload> {
        self.payload_tx.borrow().clone()
    }

    pub fn state(&self) -> RecordingState {
        self.controller.state()
    }

    pub async fn stats(&self) -> SessionStats {
        self.controller.stats().await
    }

    /// One press of the mic button: idle starts a recording, recording
    /// stops it and sends; `Sending` ignores presses entirely.
    pub async fn toggle_recording(&mut self) {
        match self.controller.state() {
            RecordingState::Idle => {
                // A new recording supersedes the previous response.
                let _ = self.payload_tx.send(None);
                if let Err(e) = self.controller.start().await {
                    warn!("Could not start recording: {}", e);
                }
            }
            RecordingState::Recording => self.stop_and_route().await,
            RecordingState::Sending => {}
        }
    }

    /// Finalize the recording, upload it, publish the resulting payload.
    /// The session returns to idle on every path out of here.
    async fn stop_and_route(&mut self) {
        let artifact = match self.controller.stop().await {
            Ok(Some(artifact)) => artifact,
            Ok(None) => return,
            Err(e) => {
                error!("Failed to finalize recording: {}", e);
                return;
            }
        };

        let payload = match self.client.upload(&artifact, self.mode).await {
            Ok(payload) => {
                let _ = self.status_tx.send("Route ready!".to_string());
                payload
            }
            Err(e) => {
                error!("Route upload failed: {}", e);
                let _ = self.status_tx.send(format!("Error: {}", e));
                RoutePayload::error("Could not build a route.")
            }
        };

        let _ = self.payload_tx.send(Some(payload));
        self.controller.finish();
    }
}

/// Re-run the renderer whenever the map handle or the payload changes.
/// Exits once both publishers are gone.
pub fn spawn_render_task(
    mut map_rx: watch::Receiver<Option<Arc<dyn MapInstance>>>,
    mut payload_rx: watch::Receiver<Option<RoutePayload>>,
    mut renderer: RouteRenderer,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            {
                let map = map_rx.borrow_and_update().clone();
                let payload = payload_rx.borrow_and_update().clone();
                if let Err(e) = renderer.render(map.as_ref(), payload.as_ref()) {
                    error!("Route rendering failed: {}", e);
                }
            }

            tokio::select! {
                changed = map_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                changed = payload_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        renderer.clear();
    })
}
