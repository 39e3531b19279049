use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::info;
use voice_route::{
    api::report_user_location, spawn_render_task, CaptureBackendFactory, CaptureConfig,
    CaptureSource, Config, GeoPosition, HeadlessMapEngine, MapSurface, RecordingController,
    RecordingState, RouteApiClient, RouteMode, RoutePayload, RouteRenderer,
    StaticLocationProvider, VoiceRouteApp,
};

#[derive(Debug, Parser)]
#[command(name = "voice-route", about = "Voice-controlled route planner client")]
struct Args {
    /// Config file name (without extension)
    #[arg(long, default_value = "config/voice-route")]
    config: String,

    /// Send recordings to the tourist route planner
    #[arg(long)]
    tourist: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("voice-route v0.1.0");
    info!("Backend API: {}", cfg.api.base_url);

    let client = RouteApiClient::new(cfg.api.base_url.clone());
    let (status_tx, mut status_rx) = watch::channel(String::from("Tap Enter to record"));

    // One-shot location report, out-of-band from the recording flow.
    let position = match (cfg.location.lat, cfg.location.lon) {
        (Some(lat), Some(lon)) => Some(GeoPosition { lat, lon }),
        _ => None,
    };
    let provider = StaticLocationProvider::new(position);
    let location_client = client.clone();
    let location_status = status_tx.clone();
    tokio::spawn(async move {
        report_user_location(&provider, &location_client, &location_status).await;
    });

    // Map surface plus the render task that follows it.
    let surface = MapSurface::new(Arc::new(HeadlessMapEngine::new()));
    surface.mount(MapSurface::initial_options(&cfg.map, None));

    let backend = CaptureBackendFactory::create(
        CaptureSource::Microphone,
        CaptureConfig {
            target_sample_rate: cfg.audio.sample_rate,
            target_channels: cfg.audio.channels,
            ..CaptureConfig::default()
        },
    )?;
    let controller =
        RecordingController::new(backend, cfg.audio.preferred_codecs.clone(), status_tx.clone());

    let mode = if args.tourist || cfg.api.tourist_mode {
        RouteMode::Tourist
    } else {
        RouteMode::Standard
    };
    let mut app = VoiceRouteApp::new(controller, client, mode, status_tx.clone());

    let renderer = RouteRenderer::new(cfg.map.api_key.clone());
    let render_task = spawn_render_task(surface.subscribe(), app.payload_subscribe(), renderer);

    // Mirror the status line into the log.
    tokio::spawn(async move {
        loop {
            info!("status: {}", status_rx.borrow_and_update().clone());
            if status_rx.changed().await.is_err() {
                break;
            }
        }
    });

    info!("Press Enter to start/stop recording, Ctrl-D to quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(_line) = lines.next_line().await? {
        app.toggle_recording().await;

        if app.state() == RecordingState::Idle {
            if let Some(payload) = app.payload() {
                log_route(&payload);
            }
        }
    }

    render_task.abort();
    surface.unmount();

    Ok(())
}

fn log_route(payload: &RoutePayload) {
    if let Some(transcript) = payload.transcript() {
        info!("Transcript: {}", transcript);
    }
    match payload {
        RoutePayload::SinglePath {
            route_type,
            pivot_route_points,
            ..
        } => info!(
            "{:?} route through {} waypoints",
            route_type,
            pivot_route_points.len()
        ),
        RoutePayload::Segmented { route, .. } => {
            info!("Segmented route with {} segments", route.len())
        }
        RoutePayload::Error { error } => info!("Backend error: {}", error),
    }
}
