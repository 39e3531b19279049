use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::stats::SessionStats;
use crate::audio::{codec, AudioChunk, CaptureBackend, CaptureError, Codec};

/// Recording lifecycle phase. Transitions are strictly
/// idle -> recording -> sending -> idle; `Sending` disables new starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    Idle,
    Recording,
    Sending,
}

/// One completed recording, ready for upload. Immutable after assembly; at
/// most one exists per session.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    pub bytes: Vec<u8>,
    pub codec: Codec,
}

impl AudioArtifact {
    /// Upload filename, extension derived from the negotiated codec.
    pub fn filename(&self) -> String {
        format!("speech.{}", self.codec.extension())
    }
}

/// Owns the capture lifecycle for one microphone at a time: stream
/// acquisition, codec negotiation, chunk buffering, artifact assembly.
///
/// Publishes a human-readable status message at every transition; the
/// message is display-only and not part of the functional contract.
pub struct RecordingController {
    session_id: Uuid,
    backend: Box<dyn CaptureBackend>,
    preferred_codecs: Vec<String>,
    state: RecordingState,
    negotiated: Option<Codec>,
    chunks: Arc<Mutex<Vec<AudioChunk>>>,
    chunks_received: Arc<AtomicUsize>,
    drain_task: Option<JoinHandle<()>>,
    started_at: Option<DateTime<Utc>>,
    status_tx: watch::Sender<String>,
}

impl RecordingController {
    pub fn new(
        backend: Box<dyn CaptureBackend>,
        preferred_codecs: Vec<String>,
        status_tx: watch::Sender<String>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            backend,
            preferred_codecs,
            state: RecordingState::Idle,
            negotiated: None,
            chunks: Arc::new(Mutex::new(Vec::new())),
            chunks_received: Arc::new(AtomicUsize::new(0)),
            drain_task: None,
            started_at: None,
            status_tx,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// The codec negotiated for the current or most recent recording.
    pub fn codec(&self) -> Option<&Codec> {
        self.negotiated.as_ref()
    }

    /// Subscribe to the status line.
    pub fn status_subscribe(&self) -> watch::Receiver<String> {
        self.status_tx.subscribe()
    }

    fn set_status(&self, message: &str) {
        let _ = self.status_tx.send(message.to_string());
    }

    /// Start a new recording
    ///
    /// No-op unless idle. Negotiates the codec from the preference list,
    /// acquires the capture stream, clears the previous session's buffer and
    /// begins draining chunks as they arrive. On failure the controller
    /// stays idle so the user can retry.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.state != RecordingState::Idle {
            warn!("Recording start ignored: session is {:?}", self.state);
            return Ok(());
        }

        self.set_status("Requesting microphone access...");

        let negotiated = match codec::negotiate(self.backend.as_ref(), &self.preferred_codecs) {
            Ok(codec) => codec,
            Err(e) => {
                self.set_status("No supported audio format for recording.");
                return Err(e);
            }
        };
        info!(
            "Session {}: negotiated codec {} on {} backend",
            self.session_id,
            negotiated.mime(),
            self.backend.name()
        );

        let rx = match self.backend.start(&negotiated).await {
            Ok(rx) => rx,
            Err(e) => {
                self.set_status(&format!("Microphone access failed: {}", e));
                return Err(e);
            }
        };

        // Reset the previous session before buffering anything new.
        self.chunks.lock().await.clear();
        self.chunks_received.store(0, Ordering::SeqCst);
        self.negotiated = Some(negotiated);
        self.started_at = Some(Utc::now());

        let chunks = Arc::clone(&self.chunks);
        let chunks_received = Arc::clone(&self.chunks_received);
        self.drain_task = Some(tokio::spawn(async move {
            let mut rx = rx;
            while let Some(chunk) = rx.recv().await {
                chunks_received.fetch_add(1, Ordering::SeqCst);
                chunks.lock().await.push(chunk);
            }
        }));

        self.state = RecordingState::Recording;
        self.set_status("Recording...");
        info!("Session {}: recording started", self.session_id);

        Ok(())
    }

    /// Finalize the recording into one artifact
    ///
    /// Returns `Ok(None)` without touching anything when not recording;
    /// stopping a recording that never started is intentional idempotence,
    /// not an error. On success the session moves to `Sending` and the
    /// caller is expected to upload the artifact and then call
    /// [`finish`](Self::finish).
    pub async fn stop(&mut self) -> Result<Option<AudioArtifact>, CaptureError> {
        if self.state != RecordingState::Recording {
            return Ok(None);
        }

        if let Err(e) = self.backend.stop().await {
            self.state = RecordingState::Idle;
            self.set_status(&format!("Recording failed: {}", e));
            return Err(e);
        }

        // The backend closed the chunk channel; wait for the drain task to
        // finish buffering everything that was in flight.
        if let Some(task) = self.drain_task.take() {
            if let Err(e) = task.await {
                error!("Chunk drain task panicked: {}", e);
            }
        }

        let buffered = {
            let mut chunks = self.chunks.lock().await;
            std::mem::take(&mut *chunks)
        };

        let Some(negotiated) = self.negotiated.clone() else {
            self.state = RecordingState::Idle;
            return Err(CaptureError::DeviceError {
                reason: "recording had no negotiated codec".to_string(),
            });
        };

        let bytes = match codec::assemble(&negotiated, &buffered) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.state = RecordingState::Idle;
                self.set_status(&format!("Recording failed: {}", e));
                return Err(e);
            }
        };

        self.state = RecordingState::Sending;
        self.set_status("Processing and sending...");
        info!(
            "Session {}: {} chunks assembled into {} bytes",
            self.session_id,
            buffered.len(),
            bytes.len()
        );

        Ok(Some(AudioArtifact {
            bytes,
            codec: negotiated,
        }))
    }

    /// Return to idle. Called after upload completion, success or failure,
    /// so the user can always record again.
    pub fn finish(&mut self) {
        self.state = RecordingState::Idle;
    }

    /// Get current session statistics
    pub async fn stats(&self) -> SessionStats {
        let duration_secs = self
            .started_at
            .map(|t| Utc::now().signed_duration_since(t).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);

        SessionStats {
            state: self.state,
            started_at: self.started_at,
            duration_secs,
            chunks_buffered: self.chunks_received.load(Ordering::SeqCst),
        }
    }
}
