use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{error, info, warn};

use super::engine::{MapEngine, MapInstance, MapOptions};
use crate::api::RoutePayload;
use crate::config::MapConfig;

struct SurfaceInner {
    mounted: bool,
    handle: Option<Arc<dyn MapInstance>>,
}

/// Owns the lifetime of the map instance.
///
/// Initializes the engine asynchronously exactly once per mount and
/// publishes the resulting handle through a watch slot; initialization is
/// not guaranteed to finish before consumers first look, so they must
/// tolerate `None`. Teardown is race-safe: an init that resolves after
/// unmount destroys the freshly created instance instead of publishing it.
pub struct MapSurface {
    engine: Arc<dyn MapEngine>,
    inner: Arc<Mutex<SurfaceInner>>,
    handle_tx: watch::Sender<Option<Arc<dyn MapInstance>>>,
}

impl MapSurface {
    pub fn new(engine: Arc<dyn MapEngine>) -> Self {
        let (handle_tx, _) = watch::channel(None);
        Self {
            engine,
            inner: Arc::new(Mutex::new(SurfaceInner {
                mounted: false,
                handle: None,
            })),
            handle_tx,
        }
    }

    /// Initial map options: center on the route's first point when a route
    /// is already known at mount time, otherwise on the configured default,
    /// at the mode-dependent zoom level.
    pub fn initial_options(config: &MapConfig, payload: Option<&RoutePayload>) -> MapOptions {
        match payload.and_then(RoutePayload::first_point) {
            Some(center) => MapOptions {
                center,
                zoom: config.route_zoom,
                key: config.api_key.clone(),
            },
            None => MapOptions {
                center: config.center,
                zoom: config.zoom,
                key: config.api_key.clone(),
            },
        }
    }

    /// Subscribe to handle publications.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<dyn MapInstance>>> {
        self.handle_tx.subscribe()
    }

    /// The currently published handle, if initialization has completed.
    pub fn handle(&self) -> Option<Arc<dyn MapInstance>> {
        self.handle_tx.borrow().clone()
    }

    /// Kick off asynchronous engine initialization. One init per mount;
    /// repeated calls while mounted are ignored.
    pub fn mount(&self, options: MapOptions) {
        {
            let mut inner = lock(&self.inner);
            if inner.mounted {
                warn!("Map surface already mounted");
                return;
            }
            inner.mounted = true;
        }

        info!("Mounting map surface ({})", self.engine.name());

        let engine = Arc::clone(&self.engine);
        let inner = Arc::clone(&self.inner);
        let handle_tx = self.handle_tx.clone();

        tokio::spawn(async move {
            match engine.create_map(options).await {
                Ok(instance) => {
                    let publish = {
                        let mut guard = lock(&inner);
                        if guard.mounted {
                            guard.handle = Some(Arc::clone(&instance));
                            true
                        } else {
                            false
                        }
                    };
                    if publish {
                        let _ = handle_tx.send(Some(instance));
                    } else {
                        // Unmounted while init was in flight; the instance
                        // must still be torn down, not leaked.
                        instance.destroy();
                    }
                }
                Err(e) => error!("Map engine initialization failed: {}", e),
            }
        });
    }

    /// Destroy the map instance and clear the published handle. Runs even
    /// if initialization never completed.
    pub fn unmount(&self) {
        let handle = {
            let mut inner = lock(&self.inner);
            inner.mounted = false;
            inner.handle.take()
        };

        let _ = self.handle_tx.send(None);

        if let Some(handle) = handle {
            handle.destroy();
            info!("Map surface unmounted");
        }
    }
}

fn lock(inner: &Arc<Mutex<SurfaceInner>>) -> std::sync::MutexGuard<'_, SurfaceInner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
