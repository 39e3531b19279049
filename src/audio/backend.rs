use thiserror::Error;
use tokio::sync::mpsc;

use super::codec::Codec;

/// Errors raised by capture backends and artifact assembly.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Microphone access denied by the user or the OS.
    #[error("Microphone access denied: {reason}")]
    PermissionDenied { reason: String },

    /// None of the preferred codecs is supported by the runtime.
    #[error("No supported audio codec in the preference list")]
    NoSupportedCodec,

    /// Audio device operation failed.
    #[error("Audio device error: {reason}")]
    DeviceError { reason: String },

    /// Encoding or container assembly failed.
    #[error("Audio encoding error: {reason}")]
    EncodeError { reason: String },
}

/// One buffered slice of captured audio, encoded per the negotiated codec
/// (raw PCM 16-bit LE for the wav codec).
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Encoded audio bytes
    pub data: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for capture backends
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Target sample rate (will downsample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono)
    pub target_channels: u16,
    /// Chunk size in milliseconds (affects delivery cadence)
    pub chunk_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz is plenty for speech
            target_channels: 1,        // Mono
            chunk_duration_ms: 100,    // 100ms chunks
        }
    }
}

/// Audio capture backend trait
///
/// Implementations:
/// - Microphone: cpal default input device
/// - Embedders supply their own (browser media capture, test doubles)
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Whether the runtime can record in the given MIME type
    fn supports_codec(&self, mime: &str) -> bool;

    /// Start capturing with the negotiated codec
    ///
    /// Returns a channel receiver that will receive audio chunks in
    /// delivery order. The channel closes once capture has fully stopped.
    async fn start(&mut self, codec: &Codec) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    /// Create a capture backend for the given source
    pub fn create(
        source: CaptureSource,
        config: CaptureConfig,
    ) -> Result<Box<dyn CaptureBackend>, CaptureError> {
        match source {
            CaptureSource::Microphone => {
                let backend = super::microphone::MicrophoneBackend::new(config);
                Ok(Box::new(backend))
            }
        }
    }
}

/// Capture source type
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Default input device (all platforms)
    Microphone,
}
