// Unit tests for the recording session state machine
//
// Exercised against scripted capture backends; no real audio device is
// involved.

use tokio::sync::{mpsc, watch};
use voice_route::audio::{AudioChunk, CaptureBackend, CaptureError, Codec};
use voice_route::{RecordingController, RecordingState};

/// Backend that delivers a fixed set of chunks and then closes the channel.
struct ScriptedBackend {
    supported: Vec<String>,
    chunks: Vec<AudioChunk>,
    capturing: bool,
}

impl ScriptedBackend {
    fn new(supported: &[&str], chunks: Vec<AudioChunk>) -> Self {
        Self {
            supported: supported.iter().map(|s| s.to_string()).collect(),
            chunks,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedBackend {
    fn supports_codec(&self, mime: &str) -> bool {
        self.supported.iter().any(|m| m == mime)
    }

    async fn start(&mut self, _codec: &Codec) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        let (tx, rx) = mpsc::channel(self.chunks.len().max(1));
        for chunk in self.chunks.clone() {
            let _ = tx.send(chunk).await;
        }
        // tx drops here; the channel closes once the chunks are drained.
        self.capturing = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend whose stream acquisition is always denied.
struct DeniedBackend;

#[async_trait::async_trait]
impl CaptureBackend for DeniedBackend {
    fn supports_codec(&self, _mime: &str) -> bool {
        true
    }

    async fn start(&mut self, _codec: &Codec) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        Err(CaptureError::PermissionDenied {
            reason: "denied by user".to_string(),
        })
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "denied"
    }
}

fn pcm_chunk(samples: &[i16], timestamp_ms: u64) -> AudioChunk {
    AudioChunk {
        data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

fn controller_with(
    backend: impl CaptureBackend + 'static,
    preferred: &[&str],
) -> RecordingController {
    let (status_tx, _status_rx) = watch::channel(String::new());
    RecordingController::new(
        Box::new(backend),
        preferred.iter().map(|s| s.to_string()).collect(),
        status_tx,
    )
}

#[tokio::test]
async fn test_stop_while_idle_is_noop() {
    let backend = ScriptedBackend::new(&["audio/wav"], vec![]);
    let mut controller = controller_with(backend, &["audio/wav"]);

    let artifact = controller.stop().await.expect("stop should not fail");

    assert!(artifact.is_none());
    assert_eq!(controller.state(), RecordingState::Idle);
}

#[tokio::test]
async fn test_start_stop_produces_wav_artifact() {
    let chunks = vec![pcm_chunk(&[1, 2, 3], 0), pcm_chunk(&[4, 5], 100)];
    let backend = ScriptedBackend::new(&["audio/wav"], chunks);
    let mut controller = controller_with(backend, &["audio/wav"]);

    controller.start().await.expect("start should succeed");
    assert_eq!(controller.state(), RecordingState::Recording);

    let artifact = controller
        .stop()
        .await
        .expect("stop should succeed")
        .expect("a recording should yield an artifact");

    assert_eq!(controller.state(), RecordingState::Sending);
    assert_eq!(artifact.filename(), "speech.wav");
    // The assembled blob is a WAV container, not bare PCM.
    assert_eq!(&artifact.bytes[..4], b"RIFF");

    controller.finish();
    assert_eq!(controller.state(), RecordingState::Idle);
}

#[tokio::test]
async fn test_stop_while_sending_is_noop() {
    let backend = ScriptedBackend::new(&["audio/wav"], vec![pcm_chunk(&[1], 0)]);
    let mut controller = controller_with(backend, &["audio/wav"]);

    controller.start().await.expect("start should succeed");
    let first = controller.stop().await.expect("stop should succeed");
    assert!(first.is_some());
    assert_eq!(controller.state(), RecordingState::Sending);

    // Sending disables stop just like it disables start.
    let second = controller.stop().await.expect("stop should not fail");
    assert!(second.is_none());
    assert_eq!(controller.state(), RecordingState::Sending);
}

#[tokio::test]
async fn test_start_while_recording_is_noop() {
    let backend = ScriptedBackend::new(&["audio/wav"], vec![pcm_chunk(&[1], 0)]);
    let mut controller = controller_with(backend, &["audio/wav"]);

    controller.start().await.expect("start should succeed");
    controller.start().await.expect("second start is ignored");

    assert_eq!(controller.state(), RecordingState::Recording);
}

#[tokio::test]
async fn test_permission_denied_returns_to_idle() {
    let mut controller = controller_with(DeniedBackend, &["audio/wav"]);

    let result = controller.start().await;

    assert!(matches!(
        result,
        Err(CaptureError::PermissionDenied { .. })
    ));
    // Non-fatal: the user may retry from idle.
    assert_eq!(controller.state(), RecordingState::Idle);
}

#[tokio::test]
async fn test_no_supported_codec_keeps_idle() {
    let backend = ScriptedBackend::new(&[], vec![]);
    let mut controller = controller_with(backend, &["audio/wav", "audio/mpeg"]);

    let result = controller.start().await;

    assert!(matches!(result, Err(CaptureError::NoSupportedCodec)));
    assert_eq!(controller.state(), RecordingState::Idle);
}

#[tokio::test]
async fn test_start_succeeds_when_any_codec_supported() {
    // The backend only supports the last fallback in the preference list.
    let backend = ScriptedBackend::new(&["audio/webm"], vec![pcm_chunk(&[1], 0)]);
    let mut controller = controller_with(
        backend,
        &["audio/wav", "audio/mpeg", "audio/webm;codecs=opus", "audio/webm"],
    );

    controller.start().await.expect("start should succeed");

    assert_eq!(controller.state(), RecordingState::Recording);
    let codec = controller.codec().expect("codec should be negotiated");
    assert_eq!(codec.mime(), "audio/webm");
}

#[tokio::test]
async fn test_artifact_extension_matches_negotiated_codec() {
    let backend = ScriptedBackend::new(
        &["audio/mpeg"],
        vec![
            AudioChunk {
                data: vec![0xff, 0xfb],
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: 0,
            },
            AudioChunk {
                data: vec![0x01, 0x02],
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: 100,
            },
        ],
    );
    let mut controller = controller_with(backend, &["audio/wav", "audio/mpeg"]);

    controller.start().await.expect("start should succeed");
    let artifact = controller
        .stop()
        .await
        .expect("stop should succeed")
        .expect("a recording should yield an artifact");

    // The MPEG-audio codec uploads as mp3, never as speech.mpeg.
    assert_eq!(artifact.filename(), "speech.mp3");
    assert_eq!(artifact.bytes, vec![0xff, 0xfb, 0x01, 0x02]);
}

#[tokio::test]
async fn test_status_line_tracks_transitions() {
    let backend = ScriptedBackend::new(&["audio/wav"], vec![pcm_chunk(&[1], 0)]);
    let mut controller = controller_with(backend, &["audio/wav"]);
    let status_rx = controller.status_subscribe();

    controller.start().await.expect("start should succeed");
    assert_eq!(&*status_rx.borrow(), "Recording...");

    controller.stop().await.expect("stop should succeed");
    assert_eq!(&*status_rx.borrow(), "Processing and sending...");
}

#[tokio::test]
async fn test_stats_reflect_buffered_chunks() {
    let chunks = vec![pcm_chunk(&[1], 0), pcm_chunk(&[2], 100), pcm_chunk(&[3], 200)];
    let backend = ScriptedBackend::new(&["audio/wav"], chunks);
    let mut controller = controller_with(backend, &["audio/wav"]);

    controller.start().await.expect("start should succeed");
    controller.stop().await.expect("stop should succeed");

    let stats = controller.stats().await;
    assert_eq!(stats.state, RecordingState::Sending);
    assert_eq!(stats.chunks_buffered, 3);
    assert!(stats.started_at.is_some());
}
